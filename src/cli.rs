//! Command-line interface definitions for vlr_scrape.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! All arguments can be provided via command-line flags or environment variables.

use crate::orchestrator::OrchestratorConfig;
use crate::render::DEFAULT_USER_AGENT;
use clap::Parser;
use std::time::Duration;
use url::Url;

/// Command-line arguments for the vlr_scrape server.
///
/// # Examples
///
/// ```sh
/// # Serve on the default port with an API key from the environment
/// API_KEY=changeme vlr_scrape
///
/// # Shorter cache window, custom port
/// vlr_scrape --port 8080 --api-key changeme --cache-ttl-secs 60
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Key clients must send in the `x-api-key` header
    #[arg(long, env = "API_KEY")]
    pub api_key: Option<String>,

    /// Seconds a scraped page is served from cache before rescraping
    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = 300)]
    pub cache_ttl_secs: u64,

    /// Seconds between cache eviction sweeps
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value_t = 60)]
    pub sweep_interval_secs: u64,

    /// Snapshots older than this many seconds are evicted by the sweep
    #[arg(long, env = "SWEEP_MAX_AGE_SECS", default_value_t = 300)]
    pub sweep_max_age_secs: u64,

    /// Upper bound on loading an upstream page, in milliseconds
    #[arg(long, env = "NAVIGATION_TIMEOUT_MS", default_value_t = 30_000)]
    pub navigation_timeout_ms: u64,

    /// Upper bound on waiting for a page's content marker, in milliseconds
    #[arg(long, env = "CONTENT_TIMEOUT_MS", default_value_t = 10_000)]
    pub content_timeout_ms: u64,

    /// Origin of the matches, results and news pages
    #[arg(long, env = "VLR_BASE_URL", default_value = "https://www.vlr.gg")]
    pub vlr_base_url: Url,

    /// Origin of the quotes pages
    #[arg(long, env = "QUOTES_BASE_URL", default_value = "http://quotes.toscrape.com")]
    pub quotes_base_url: Url,

    /// User agent sent upstream
    #[arg(long, env = "SCRAPE_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}

impl Cli {
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            ttl: Duration::from_secs(self.cache_ttl_secs),
            navigation_timeout: Duration::from_millis(self.navigation_timeout_ms),
            content_timeout: Duration::from_millis(self.content_timeout_ms),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn sweep_max_age(&self) -> Duration {
        Duration::from_secs(self.sweep_max_age_secs)
    }
}
