//! Supabase (PostgREST) storage backend.
//!
//! Talks to `{NEXT_PUBLIC_SUPABASE_URL}/rest/v1/<table>` with the service-role
//! key. Reads are paginated with `limit`/`offset`; writes are one request per
//! call with no transaction spanning requests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{AppError, Result, UNIQUE_VIOLATION_CODE};
use crate::models::{LocationIdentity, LocationRow, ScraperConfig};
use crate::services::create_client;
use crate::storage::LocationStore;
use crate::utils::env::env_req;

/// Rows per page on full-table scans.
pub const PAGE_SIZE: usize = 1000;

/// Ids per `in.(...)` filter, keeping request URLs short.
const FILTER_CHUNK: usize = 100;

const LOCATIONS: &str = "locations";
const PLACE_DETAILS: &str = "place_details";

/// Error body returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    #[allow(dead_code)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct PrefectureOnly {
    prefecture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetailKey {
    location_id: String,
}

/// Service-role client for the hosted database.
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    rest_url: Url,
    service_key: String,
}

impl SupabaseStore {
    pub fn new(client: Client, base_url: &str, service_key: impl Into<String>) -> Result<Self> {
        let rest_url = Url::parse(&format!("{}/rest/v1/", base_url.trim_end_matches('/')))?;
        Ok(Self {
            client,
            rest_url,
            service_key: service_key.into(),
        })
    }

    /// Build from `NEXT_PUBLIC_SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY`.
    pub fn from_env(config: &ScraperConfig) -> Result<Self> {
        let url = env_req("NEXT_PUBLIC_SUPABASE_URL")?;
        let key = env_req("SUPABASE_SERVICE_ROLE_KEY")?;
        Self::new(create_client(config)?, &url, key)
    }

    fn table_url(&self, table: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.rest_url.join(table)?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    /// Page through `table` until a short page comes back.
    async fn select_all<T: DeserializeOwned>(
        &self,
        table: &str,
        columns: &str,
        order: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut rows = Vec::new();
        let mut offset = 0usize;
        loop {
            let limit = PAGE_SIZE.to_string();
            let offset_str = offset.to_string();
            let mut params = vec![
                ("select", columns),
                ("order", order),
                ("limit", limit.as_str()),
                ("offset", offset_str.as_str()),
            ];
            params.extend_from_slice(filters);

            let url = self.table_url(table, &params)?;
            let response = check(self.request(Method::GET, url).send().await?).await?;
            let page: Vec<T> = response.json().await?;
            let fetched = page.len();
            rows.extend(page);

            log::debug!("{}: fetched {} rows at offset {}", table, fetched, offset);
            if fetched < PAGE_SIZE {
                break;
            }
            offset += PAGE_SIZE;
        }
        Ok(rows)
    }
}

/// Pass successful responses through; map PostgREST errors.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(map_error(status.as_u16(), &body))
}

fn map_error(status: u16, body: &str) -> AppError {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let mut message = parsed.message.unwrap_or_else(|| body.trim().to_string());
    if let Some(details) = parsed.details.filter(|d| !d.is_empty()) {
        message = format!("{message} ({details})");
    }
    if parsed.code.as_deref() == Some(UNIQUE_VIOLATION_CODE) {
        return AppError::UniqueViolation(message);
    }
    AppError::Database {
        status,
        code: parsed.code,
        message,
    }
}

/// PostgREST `in.(...)` filter value.
fn in_filter(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

#[async_trait]
impl LocationStore for SupabaseStore {
    async fn load_identities(&self) -> Result<Vec<LocationIdentity>> {
        self.select_all(LOCATIONS, "id,name,region,place_id,seed_source_url", "id", &[])
            .await
    }

    async fn insert_locations(&self, rows: &[LocationRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = self.table_url(LOCATIONS, &[])?;
        let response = self
            .request(Method::POST, url)
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn prefecture_counts(&self) -> Result<BTreeMap<String, usize>> {
        let rows: Vec<PrefectureOnly> = self
            .select_all(LOCATIONS, "prefecture", "id", &[("prefecture", "not.is.null")])
            .await?;
        let mut counts = BTreeMap::new();
        for prefecture in rows.into_iter().filter_map(|r| r.prefecture) {
            *counts.entry(prefecture).or_default() += 1;
        }
        Ok(counts)
    }

    async fn rename_prefecture(&self, from: &str, to: &str) -> Result<usize> {
        let filter = format!("eq.{from}");
        let url = self.table_url(LOCATIONS, &[("prefecture", filter.as_str()), ("select", "id")])?;
        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "prefecture": to }))
            .send()
            .await?;
        let updated: Vec<IdOnly> = check(response).await?.json().await?;
        Ok(updated.len())
    }

    async fn update_location_name(&self, id: &str, name: &str) -> Result<bool> {
        let filter = format!("eq.{id}");
        let url = self.table_url(LOCATIONS, &[("id", filter.as_str()), ("select", "id")])?;
        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await?;
        let updated: Vec<IdOnly> = check(response).await?.json().await?;
        Ok(!updated.is_empty())
    }

    async fn place_detail_location_ids(&self) -> Result<Vec<String>> {
        let rows: Vec<PlaceDetailKey> = self
            .select_all(PLACE_DETAILS, "location_id", "location_id", &[])
            .await?;
        Ok(rows.into_iter().map(|r| r.location_id).collect())
    }

    async fn delete_place_details(&self, location_ids: &[String]) -> Result<usize> {
        let mut deleted = 0;
        for chunk in location_ids.chunks(FILTER_CHUNK) {
            let filter = in_filter(chunk);
            let url = self.table_url(
                PLACE_DETAILS,
                &[("location_id", filter.as_str()), ("select", "location_id")],
            )?;
            let response = self
                .request(Method::DELETE, url)
                .header("Prefer", "return=representation")
                .send()
                .await?;
            let rows: Vec<PlaceDetailKey> = check(response).await?.json().await?;
            deleted += rows.len();
        }
        Ok(deleted)
    }

    async fn clear_place_details(&self) -> Result<usize> {
        // PostgREST refuses an unfiltered DELETE
        let url = self.table_url(
            PLACE_DETAILS,
            &[("location_id", "not.is.null"), ("select", "location_id")],
        )?;
        let response = self
            .request(Method::DELETE, url)
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let rows: Vec<PlaceDetailKey> = check(response).await?.json().await?;
        Ok(rows.len())
    }
}
