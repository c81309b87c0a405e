//! Markup generation for every view the site shows.
//!
//! All functions are pure: data in, HTML fragment out. Interpolated text is
//! escaped here; links come from [`crate::navigation`]. Each clickable element
//! also carries a `data-nav` attribute holding its target so a page script can
//! bind click handlers without re-deriving URLs.

use chrono::{DateTime, Utc};

use crate::content::{excerpt, paragraphs};
use crate::models::{ArticleRecord, Category};
use crate::navigation::{article_href, category_href};

const EXCERPT_CHARS: usize = 120;

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// One tile per category with its article count.
pub fn categories_view(categories: &[Category]) -> String {
    if categories.is_empty() {
        return empty_state("No categories available yet.");
    }

    let mut html = String::from("<ul class=\"category-list\">\n");
    for category in categories {
        let href = escape_html(&category_href(&category.name));
        html.push_str(&format!(
            r#"  <li class="category-tile" data-nav="{href}"><a href="{href}"><span class="category-name">{name}</span> <span class="category-count">{count}</span></a></li>"#,
            name = escape_html(&category.name),
            count = category.count,
        ));
        html.push('\n');
    }
    html.push_str("</ul>\n");
    html
}

/// Article cards for one category, in the order given.
pub fn article_list_view(category: &str, articles: &[&ArticleRecord]) -> String {
    let mut html = format!(
        "<h1 class=\"list-title\">{}</h1>\n",
        escape_html(category)
    );
    if articles.is_empty() {
        html.push_str(&empty_state("No articles in this category."));
        return html;
    }

    html.push_str("<ul class=\"article-list\">\n");
    for article in articles {
        html.push_str(&article_card(article));
    }
    html.push_str("</ul>\n");
    html
}

fn article_card(article: &ArticleRecord) -> String {
    let mut inner = String::new();
    if let Some(src) = &article.image {
        inner.push_str(&format!(
            r#"<img class="article-thumb" src="{}" alt="" loading="lazy">"#,
            escape_html(src)
        ));
    }
    inner.push_str(&format!(
        r#"<h2 class="article-title">{}</h2>"#,
        escape_html(&article.title)
    ));
    if let Some(ts) = article.created_at {
        inner.push_str(&time_tag(ts));
    }
    let teaser = excerpt(&article.content, EXCERPT_CHARS);
    if !teaser.is_empty() {
        inner.push_str(&format!(r#"<p class="article-excerpt">{}</p>"#, escape_html(&teaser)));
    }

    match article_href(&article.id) {
        Some(href) => {
            let href = escape_html(&href);
            format!("  <li class=\"article-card\" data-nav=\"{href}\"><a href=\"{href}\">{inner}</a></li>\n")
        }
        None => format!("  <li class=\"article-card\">{inner}</li>\n"),
    }
}

/// Full article, or a not-found state when the id matched nothing.
pub fn article_detail_view(article: Option<&ArticleRecord>) -> String {
    let Some(article) = article else {
        return empty_state("This article could not be found.");
    };

    let mut html = String::from("<article class=\"article-detail\">\n");
    html.push_str(&format!(
        "  <h1 class=\"article-title\">{}</h1>\n",
        escape_html(&article.title)
    ));
    if let Some(ts) = article.created_at {
        html.push_str(&format!("  {}\n", time_tag(ts)));
    }
    if !article.category.is_empty() {
        let href = escape_html(&category_href(&article.category));
        html.push_str(&format!(
            "  <a class=\"article-category\" href=\"{href}\" data-nav=\"{href}\">{}</a>\n",
            escape_html(&article.category)
        ));
    }
    if let Some(src) = &article.image {
        html.push_str(&format!(
            "  <img class=\"article-image\" src=\"{}\" alt=\"\">\n",
            escape_html(src)
        ));
    }
    for paragraph in paragraphs(&article.content) {
        html.push_str(&format!("  <p>{}</p>\n", escape_html(&paragraph)));
    }
    html.push_str("</article>\n");
    html
}

/// Banner shown when live loading failed, with a retry action.
pub fn error_view(message: &str, retry_href: &str) -> String {
    format!(
        "<div class=\"load-error\" role=\"alert\"><p>{}</p>{}</div>\n",
        escape_html(message),
        refresh_action(retry_href, "Try again"),
    )
}

/// Notice shown above content rendered from the stored snapshot.
pub fn stale_notice(saved_at: DateTime<Utc>) -> String {
    format!(
        "<div class=\"stale-notice\" role=\"status\">Showing saved content from <time datetime=\"{}\">{}</time>; it may be out of date.</div>\n",
        saved_at.to_rfc3339(),
        saved_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

/// Static fallback when neither the feed nor a snapshot has anything to show.
pub fn default_view(refresh_href: &str) -> String {
    format!(
        "<div class=\"default-state\"><p>Content is not available right now.</p>{}</div>\n",
        refresh_action(refresh_href, "Refresh"),
    )
}

fn refresh_action(href: &str, label: &str) -> String {
    let href = escape_html(href);
    format!(r#"<a class="refresh-action" href="{href}" data-action="refresh">{label}</a>"#)
}

fn time_tag(ts: DateTime<Utc>) -> String {
    format!(
        r#"<time class="article-date" datetime="{}">{}</time>"#,
        ts.to_rfc3339(),
        ts.format("%Y-%m-%d")
    )
}

fn empty_state(message: &str) -> String {
    format!("<div class=\"empty-state\">{}</div>\n", escape_html(message))
}
