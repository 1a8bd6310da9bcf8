//! Koku Travel scraper CLI
//!
//! Scrapes the regional tourism sites into `tmp/` artifacts and runs the
//! seeding and repair passes against the Supabase `locations` table.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use koku_scraper::{
    error::Result,
    models::Config,
    pipeline::{self, ExistingLocationCache},
    scrapers::{self, JntoScraper},
    services::HttpFetcher,
    storage::{ArtifactWriter, SupabaseStore, load_scraped_locations},
    utils::env,
};

/// koku-scraper - Japanese tourism site scraper and seeder
#[derive(Parser, Debug)]
#[command(
    name = "koku-scraper",
    version,
    about = "Scrapes regional tourism sites and seeds the locations table"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "koku.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one site scraper
    Scrape {
        /// hokkaido, tohoku, central-japan, kyushu, okinawa, shikoku,
        /// chugoku, kansai or jnto
        site: String,

        /// Skip the database duplicate check
        #[arg(long)]
        no_db_check: bool,
    },

    /// Run every regional scraper in sequence
    RunAll {
        /// Include the nationwide JNTO scraper
        #[arg(long)]
        jnto: bool,
    },

    /// Insert scraped JNTO locations into the database
    SeedJnto {
        /// Scraped JSON (default: seed.input from config)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Rewrite prefecture spellings to their canonical form
    NormalizePrefectures {
        /// Apply the updates
        #[arg(long, conflicts_with = "dry_run")]
        execute: bool,

        /// Only print the plan (default)
        #[arg(long)]
        dry_run: bool,
    },

    /// Apply display names from a places-enriched JSON file
    UpdateNames {
        #[arg(long)]
        input: PathBuf,
    },

    /// Delete place details whose location no longer exists
    CleanupCache {
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Database snapshot for duplicate checks, or `None` when the database is
/// not configured or unreachable.
async fn existing_cache(config: &Config) -> Option<ExistingLocationCache> {
    let store = match SupabaseStore::from_env(&config.scraper) {
        Ok(store) => store,
        Err(e) => {
            log::warn!("Database duplicate check disabled: {}", e);
            return None;
        }
    };
    match ExistingLocationCache::load(&store).await {
        Ok(cache) => Some(cache),
        Err(e) => {
            log::warn!("Could not load existing locations, continuing without: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    env::init_env();

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    let test_mode = env::env_flag("TEST_MODE", false);
    if test_mode {
        log::info!("TEST_MODE enabled");
    }
    let writer = ArtifactWriter::new(&config.output.dir);

    match cli.command {
        Command::Scrape { site, no_db_check } => {
            let scraper = scrapers::by_name(&site, &config, test_mode)?;
            let fetcher = HttpFetcher::new(&config.scraper)?;
            let cache = if scraper.uses_existing_cache() && !no_db_check {
                existing_cache(&config).await
            } else {
                None
            };

            pipeline::run_scraper(scraper.as_ref(), &fetcher, &config, cache.as_ref(), &writer)
                .await?;
        }

        Command::RunAll { jnto } => {
            let mut list = scrapers::regional();
            if jnto {
                list.push(Box::new(JntoScraper::from_config(&config.jnto, test_mode)));
            }
            let fetcher = HttpFetcher::new(&config.scraper)?;
            let cache = if jnto {
                existing_cache(&config).await
            } else {
                None
            };

            let output =
                pipeline::run_all(&list, &fetcher, &config, cache.as_ref(), &writer).await?;
            pipeline::ensure_all_succeeded(&output)?;
        }

        Command::SeedJnto { input } => {
            let store = SupabaseStore::from_env(&config.scraper)?;
            let input = input.unwrap_or_else(|| config.seed.input.clone());
            log::info!("Reading {}", input.display());

            let locations = load_scraped_locations(&input).await?;
            let report = pipeline::seed_locations(&store, &locations, config.seed.batch_size).await?;
            if report.failed > 0 {
                log::warn!("{} rows could not be inserted", report.failed);
            }
        }

        Command::NormalizePrefectures { execute, dry_run } => {
            let store = SupabaseStore::from_env(&config.scraper)?;
            pipeline::normalize_prefectures(&store, execute && !dry_run).await?;
        }

        Command::UpdateNames { input } => {
            let store = SupabaseStore::from_env(&config.scraper)?;
            let entries = pipeline::load_enriched(&input).await?;
            pipeline::update_location_names(&store, &entries).await?;
        }

        Command::CleanupCache { dry_run } => {
            let store = SupabaseStore::from_env(&config.scraper)?;
            pipeline::cleanup_place_details(&store, dry_run).await?;
        }

        Command::Validate => {
            log::info!("✓ Config OK ({})", cli.config.display());
            log::info!("Scrapers: {}", scrapers::SCRAPER_NAMES.join(", "));
        }
    }

    log::info!("Done!");

    Ok(())
}
