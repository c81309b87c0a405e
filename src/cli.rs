//! Command-line interface definitions for feed_pages.
//!
//! Every setting except the route and output path can also come from the
//! YAML config file; flags and their environment variables win over it.

use clap::Parser;

/// Render one page of a feed-driven site.
///
/// # Examples
///
/// ```sh
/// # Category index to stdout
/// feed_pages --feed-url "https://api.example.com/articles?limit=60"
///
/// # Article list for one category, written to a file
/// feed_pages "list.html?type=Tech" -c site.yaml -o public/list.html
///
/// # Keep the page fresh every five minutes
/// feed_pages -c site.yaml -o public/index.html --refresh-interval 300
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Page to render: `index.html`, `list.html?type=<category>` or `detail.html?id=<id>`
    #[arg(default_value = "index.html")]
    pub route: String,

    /// Optional path to a YAML site config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Feed endpoint URL
    #[arg(long, env = "FEED_URL")]
    pub feed_url: Option<String>,

    /// Write the page here instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Directory holding the last good feed snapshot
    #[arg(long, env = "FEED_STORAGE_DIR")]
    pub storage_dir: Option<String>,

    /// Base URL for relative image names
    #[arg(long, env = "FEED_IMAGE_BASE_URL")]
    pub image_base_url: Option<String>,

    /// Live fetch attempts before falling back to the snapshot
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Backoff unit; attempt n waits n times this long
    #[arg(long)]
    pub base_delay_ms: Option<u64>,

    /// Re-run a manual refresh every N seconds and rewrite the page
    #[arg(long)]
    pub refresh_interval: Option<u64>,
}
