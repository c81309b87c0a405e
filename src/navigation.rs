//! Page routes and the links between them.
//!
//! The site has three pages. A category tile links to the list page with the
//! category name in a `type` query parameter; an article card links to the
//! detail page with the article id in an `id` query parameter.
//!
//! ```text
//! index.html                 -> Route::Categories
//! list.html?type=Tech%20News -> Route::List { category: "Tech News" }
//! detail.html?id=42          -> Route::Detail { id: "42" }
//! ```

use url::form_urlencoded;

pub const INDEX_PAGE: &str = "index.html";
pub const LIST_PAGE: &str = "list.html";
pub const DETAIL_PAGE: &str = "detail.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Categories,
    List { category: String },
    Detail { id: String },
}

impl Route {
    /// Resolve a page URL (relative or absolute) into a route.
    ///
    /// `type` takes precedence over `id`; anything unrecognised is the
    /// category index.
    pub fn parse(raw: &str) -> Self {
        let without_fragment = raw.split('#').next().unwrap_or_default();
        let query = without_fragment
            .split_once('?')
            .map(|(_, q)| q)
            .unwrap_or_default();

        let mut category = None;
        let mut id = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "type" if category.is_none() => category = Some(value.to_string()),
                "id" if id.is_none() => id = Some(value.to_string()),
                _ => {}
            }
        }

        match (category, id) {
            (Some(category), _) => Route::List { category },
            (None, Some(id)) if !is_placeholder_id(&id) => Route::Detail { id },
            _ => Route::Categories,
        }
    }

    pub fn href(&self) -> String {
        match self {
            Route::Categories => INDEX_PAGE.to_string(),
            Route::List { category } => {
                format!("{LIST_PAGE}?type={}", urlencoding::encode(category))
            }
            Route::Detail { id } => format!("{DETAIL_PAGE}?id={}", urlencoding::encode(id)),
        }
    }
}

/// Ids the feed uses for "no article"; these never get a detail link.
pub fn is_placeholder_id(id: &str) -> bool {
    matches!(id.trim(), "" | "0" | "#" | "-" | "undefined" | "null")
}

/// Detail link for an article, unless its id is a placeholder.
pub fn article_href(id: &str) -> Option<String> {
    (!is_placeholder_id(id)).then(|| Route::Detail { id: id.trim().to_string() }.href())
}

pub fn category_href(name: &str) -> String {
    Route::List {
        category: name.to_string(),
    }
    .href()
}
