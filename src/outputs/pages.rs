//! Full-page HTML for a route.
//!
//! # Page Body by Outcome
//!
//! | Outcome | Body |
//! |---------|------|
//! | `Live` | the route's view |
//! | `Stale` | stale notice, then the route's view |
//! | `Default` | error banner with retry, then the static default state |

use std::error::Error;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

use crate::controller::{LoadOutcome, LoadReport};
use crate::navigation::Route;
use crate::processor::{Partition, find_article, select_by_category};
use crate::render::{
    article_detail_view, article_list_view, categories_view, default_view, error_view,
    escape_html, stale_notice,
};

/// Render the complete document for `route` from the controller's result.
pub fn render_route(route: &Route, report: &LoadReport, site_title: &str) -> String {
    let (title, body) = match &report.outcome {
        LoadOutcome::Live(partition) => route_view(route, partition, site_title),
        LoadOutcome::Stale {
            partition,
            saved_at,
        } => {
            let (title, view) = route_view(route, partition, site_title);
            (title, format!("{}{}", stale_notice(*saved_at), view))
        }
        LoadOutcome::Default { .. } => {
            let href = route.href();
            let body = format!(
                "{}{}",
                error_view("We couldn't load the latest content.", &href),
                default_view(&href)
            );
            (site_title.to_string(), body)
        }
    };
    page_document(&title, &body)
}

fn route_view(route: &Route, partition: &Partition, site_title: &str) -> (String, String) {
    match route {
        Route::Categories => (site_title.to_string(), categories_view(&partition.categories)),
        Route::List { category } => {
            let selected = select_by_category(&partition.articles, category);
            (
                format!("{category} - {site_title}"),
                article_list_view(category, &selected),
            )
        }
        Route::Detail { id } => {
            let article = find_article(&partition.articles, id);
            let title = article
                .map(|a| format!("{} - {site_title}", a.title))
                .unwrap_or_else(|| site_title.to_string());
            (title, article_detail_view(article))
        }
    }
}

fn page_document(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
</head>
<body>
<main>
{body}</main>
</body>
</html>
"#,
        title = escape_html(title),
    )
}

/// Write `html` to `output`, or to stdout when no path is given.
#[instrument(level = "info", skip_all, fields(output = ?output))]
pub async fn write_page(html: &str, output: Option<&str>) -> Result<(), Box<dyn Error>> {
    let Some(path) = output else {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(html.as_bytes()).await?;
        stdout.flush().await?;
        return Ok(());
    };

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }
    fs::write(path, html).await?;
    info!(path, bytes = html.len(), "Wrote page");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FeedError, FetchError};
    use crate::models::FeedPayload;
    use crate::processor::{OrderFields, partition};
    use crate::test_support::SAMPLE_FEED;
    use chrono::DateTime;

    fn sample() -> Partition {
        partition(&FeedPayload::from_json(SAMPLE_FEED).unwrap(), &OrderFields::default(), None)
    }

    fn live() -> LoadReport {
        LoadReport {
            outcome: LoadOutcome::Live(sample()),
            attempts: 1,
        }
    }

    #[test]
    fn test_index_page() {
        let html = render_route(&Route::Categories, &live(), "Market Daily");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Market Daily</title>"));
        let tech = html.find("list.html?type=Tech").unwrap();
        let life = html.find("list.html?type=Life").unwrap();
        assert!(tech < life);
        assert!(!html.contains("stale-notice"));
    }

    #[test]
    fn test_list_page_uses_case_insensitive_match() {
        let route = Route::parse("list.html?type=tech");
        let html = render_route(&route, &live(), "Site");
        assert!(html.contains("detail.html?id=5"));
        assert!(!html.contains("detail.html?id=3"));
    }

    #[test]
    fn test_detail_page() {
        let html = render_route(&Route::Detail { id: "5".into() }, &live(), "Site");
        assert!(html.contains("<title>A - Site</title>"));
        assert!(html.contains("<p>Alpha &amp; more</p>"));

        let html = render_route(&Route::Detail { id: "404".into() }, &live(), "Site");
        assert!(html.contains("could not be found"));
    }

    #[test]
    fn test_stale_page_shows_notice_and_snapshot_content() {
        let report = LoadReport {
            outcome: LoadOutcome::Stale {
                partition: sample(),
                saved_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            },
            attempts: 3,
        };
        let html = render_route(&Route::Categories, &report, "Site");
        assert!(html.contains("stale-notice"));
        assert!(html.contains("list.html?type=Tech"));
        assert!(html.contains("list.html?type=Life"));
    }

    #[test]
    fn test_default_page_offers_refresh() {
        let report = LoadReport {
            outcome: LoadOutcome::Default {
                last_error: Some(FeedError::Fetch(FetchError::Status { status: 500 })),
            },
            attempts: 3,
        };
        let html = render_route(&Route::List { category: "Tech".into() }, &report, "Site");
        assert!(html.contains("default-state"));
        assert!(html.contains(r#"data-action="refresh""#));
        assert!(html.contains(r#"href="list.html?type=Tech""#));
        // No raw technical error text reaches the page.
        assert!(!html.contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_write_page_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public/index.html");
        write_page("<p>hi</p>", path.to_str()).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>hi</p>");
    }
}
