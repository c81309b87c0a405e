//! # feed_pages
//!
//! Renders the pages of a feed-driven news/finance brochure site. A single
//! remote JSON feed supplies a metadata record followed by articles; the
//! pipeline groups them into categories and renders the category index, a
//! per-category article list, or an article detail page.
//!
//! ## Usage
//!
//! ```sh
//! feed_pages "list.html?type=Tech" --feed-url https://api.example.com/articles -o list.html
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetch**: [`fetcher::FeedCache`] fetches and memoises the payload,
//!    sharing one in-flight request between concurrent callers
//! 2. **Retry / fallback**: [`controller::PageController`] retries with
//!    linear backoff, then falls back to the stored snapshot
//! 3. **Process**: [`processor`] splits the payload into articles and ordered
//!    categories
//! 4. **Render**: [`render`] and [`outputs::pages`] produce the HTML

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod content;
mod controller;
mod error;
mod fetcher;
mod models;
mod navigation;
mod outputs;
mod processor;
mod render;
mod storage;
#[cfg(test)]
mod test_support;
mod utils;

use cli::Cli;
use config::SiteConfig;
use controller::PageController;
use fetcher::{FeedCache, HttpTransport};
use navigation::Route;
use outputs::pages;
use storage::FileStore;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    // Pages may go to stdout, so logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("feed_pages starting up");

    let args = Cli::parse();
    debug!(route = %args.route, ?args.config, ?args.output, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = match &args.config {
        Some(path) => SiteConfig::load(path).await.inspect_err(|e| {
            error!(path = %path, error = %e, "Failed to load site configuration");
        })?,
        None => SiteConfig::default(),
    };
    config.apply_cli(&args);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }
    let feed_url = config.feed_url()?;
    let image_base = config.image_base()?;

    // The snapshot is optional; an unusable storage dir only loses the fallback.
    if let Err(e) = ensure_writable_dir(&config.storage_dir).await {
        warn!(
            path = %config.storage_dir,
            error = %e,
            "Snapshot directory is not writable; offline fallback may be unavailable"
        );
    }

    // ---- Pipeline ----
    let route = Route::parse(&args.route);
    info!(?route, feed_url = %feed_url, "Rendering route");

    let transport = HttpTransport::new(config.request_timeout())?;
    let controller = PageController::new(
        FeedCache::new(feed_url.as_str(), transport),
        FileStore::new(&config.storage_dir),
        config.retry_policy(),
        config.order_fields.clone(),
        image_base,
    );

    let report = controller.load().await;
    info!(
        state = ?report.state(),
        attempts = report.attempts,
        articles = report.partition().map_or(0, |p| p.articles.len()),
        "Load finished"
    );
    let html = pages::render_route(&route, &report, &config.site_title);
    pages::write_page(&html, args.output.as_deref()).await?;

    if let Some(secs) = args.refresh_interval.filter(|s| *s > 0) {
        info!(interval_secs = secs, "Entering refresh loop");
        let mut ticker = tokio::time::interval(Duration::from_secs(secs));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let report = controller.refresh().await;
            info!(state = ?report.state(), attempts = report.attempts, "Refresh finished");
            let html = pages::render_route(&route, &report, &config.site_title);
            if let Err(e) = pages::write_page(&html, args.output.as_deref()).await {
                error!(error = %e, "Failed to write refreshed page");
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
