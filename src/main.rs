//! # vlr_scrape
//!
//! An HTTP service that scrapes matches, results and news from vlr.gg (and
//! quotes from quotes.toscrape.com) and serves them as JSON with bounded
//! staleness.
//!
//! ## Usage
//!
//! ```sh
//! API_KEY=changeme vlr_scrape --port 3000
//! curl -H 'x-api-key: changeme' 'localhost:3000/vlr/matches?page=1&limit=5'
//! ```
//!
//! ## Architecture
//!
//! Each request flows through the same pipeline:
//! 1. **Routing**: [`api`] validates `page`/`limit` and the API key
//! 2. **Orchestration**: [`orchestrator`] serves a fresh snapshot from [`cache`] or scrapes
//! 3. **Rendering**: [`render`] loads the upstream page and waits for its content marker
//! 4. **Extraction**: [`scrapers`] turn the page into validated records
//!
//! A background sweep evicts old snapshots so memory stays bounded.

use std::error::Error;
use std::sync::Arc;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cache;
mod cli;
mod error;
mod models;
mod orchestrator;
mod render;
mod scrapers;
#[cfg(test)]
mod testing;
mod utils;

use api::AppState;
use cache::{Clock, FreshnessCache, SystemClock};
use cli::Cli;
use orchestrator::Orchestrator;
use render::HttpRenderer;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("vlr_scrape starting up");

    let args = Cli::parse();
    debug!(host = %args.host, port = args.port, ttl_secs = args.cache_ttl_secs, "Parsed CLI arguments");

    if args.api_key.is_none() {
        warn!("API_KEY is not set; every route except / will answer 401");
    }

    // ---- Core services ----
    let cache = Arc::new(FreshnessCache::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let renderer = Arc::new(HttpRenderer::new(&args.user_agent)?);
    let orchestrator = Orchestrator::new(
        Arc::clone(&cache),
        renderer,
        Arc::clone(&clock),
        args.orchestrator_config(),
    )
    .with_extractors(scrapers::default_extractors(
        &args.vlr_base_url,
        &args.quotes_base_url,
    ));
    info!(
        vlr = %args.vlr_base_url,
        quotes = %args.quotes_base_url,
        ttl_secs = args.cache_ttl_secs,
        "Orchestrator ready"
    );

    // ---- Cache sweep ----
    let sweep = tokio::spawn(sweep_cache(
        Arc::clone(&cache),
        Arc::clone(&clock),
        args.sweep_interval(),
        args.sweep_max_age(),
    ));

    // ---- Serve ----
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        api_key: args.api_key.as_deref().map(Arc::from),
    };
    let app = api::router(state);
    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweep.abort();
    info!(cached = cache.len(), "Shut down; dropping cache");
    Ok(())
}

/// Evict snapshots older than `max_age` every `interval`.
async fn sweep_cache(
    cache: Arc<FreshnessCache>,
    clock: Arc<dyn Clock>,
    interval: std::time::Duration,
    max_age: std::time::Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let evicted = cache.evict_older_than(max_age, clock.now());
        if evicted > 0 {
            info!(evicted, remaining = cache.len(), "Evicted old snapshots");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
