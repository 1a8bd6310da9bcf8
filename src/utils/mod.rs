//! Utility functions and helpers.

pub mod console;
pub mod env;
pub mod html;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a URL string against a base URL string.
pub fn resolve(base_url: &str, href: &str) -> Option<String> {
    Url::parse(base_url)
        .ok()
        .map(|base| resolve_url(&base, href))
}

/// Extract the host from a URL string, without a leading `www.`.
pub fn extract_domain(url_str: &str) -> Option<String> {
    Url::parse(url_str).ok().and_then(|u| {
        u.host_str()
            .map(|host| host.trim_start_matches("www.").to_string())
    })
}
