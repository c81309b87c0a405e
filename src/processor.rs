//! Splitting a feed payload into articles and ordered categories.
//!
//! Everything here is pure: the same payload and configuration always give
//! the same [`Partition`].
//!
//! # Category Ordering
//!
//! The metadata element may carry the preferred category order under one of
//! several field names. Those names are configured as [`OrderFields`] and
//! probed in order; the first field holding an array wins. When the order is
//! empty, or matches none of the feed's categories, categories keep the order
//! in which they were first seen.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use tracing::debug;
use url::Url;

use crate::models::{ArticleRecord, Category, FeedPayload};

/// Metadata field names that may hold the category order, highest priority first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderFields(Vec<String>);

impl OrderFields {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for OrderFields {
    fn default() -> Self {
        Self::new(["info1", "info2", "info3", "info4", "info5", "categories", "order"])
    }
}

/// Articles and categories derived from one payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partition {
    pub articles: Vec<ArticleRecord>,
    pub categories: Vec<Category>,
}

impl Partition {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Read the preferred category order out of the metadata element.
pub fn extract_category_order(payload: &FeedPayload, fields: &OrderFields) -> Vec<String> {
    let Some(meta) = payload.metadata().and_then(Value::as_object) else {
        return Vec::new();
    };
    let Some((field, names)) = fields
        .iter()
        .find_map(|f| meta.get(f).and_then(Value::as_array).map(|a| (f, a)))
    else {
        return Vec::new();
    };

    let order: Vec<String> = names
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unique()
        .map(str::to_string)
        .collect();
    debug!(field, count = order.len(), "Extracted category order");
    order
}

/// Split a payload into articles and display-ordered categories.
///
/// Element 0 is treated as metadata and never becomes an article. Every later
/// element with a truthy `id` is kept, typed or not; only typed articles are
/// grouped into categories.
///
/// # Arguments
///
/// * `payload` - The parsed feed array
/// * `fields` - Metadata field names probed for the category order
/// * `image_base` - Base URL for relative image references, if configured
///
/// # Returns
///
/// A [`Partition`] whose categories follow the metadata order when it names at
/// least one category present in the feed, otherwise first-seen order.
///
/// # Examples
///
/// ```ignore
/// let payload = FeedPayload::from_json(r#"[{"info1":["Life","Tech"]},{"id":"1","type":"Tech"}]"#)?;
/// let part = partition(&payload, &OrderFields::default(), None);
/// assert_eq!(part.articles.len(), 1);
/// assert_eq!(part.categories[0].name, "Tech");
/// ```
pub fn partition(payload: &FeedPayload, fields: &OrderFields, image_base: Option<&Url>) -> Partition {
    let articles: Vec<ArticleRecord> = payload
        .records()
        .iter()
        .filter_map(|v| ArticleRecord::from_value(v, image_base))
        .collect();

    let seen = group_first_seen(&articles);
    let order = extract_category_order(payload, fields);
    let categories = if order.is_empty() {
        seen
    } else {
        let ordered: Vec<Category> = order
            .iter()
            .filter_map(|name| seen.iter().find(|c| &c.name == name).cloned())
            .collect();
        if ordered.is_empty() { seen } else { ordered }
    };

    debug!(
        records = payload.records().len(),
        articles = articles.len(),
        categories = categories.len(),
        "Partitioned feed payload"
    );
    Partition {
        articles,
        categories,
    }
}

fn group_first_seen(articles: &[ArticleRecord]) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();
    for article in articles.iter().filter(|a| !a.category.is_empty()) {
        match categories.iter_mut().find(|c| c.name == article.category) {
            Some(c) => c.count += 1,
            None => categories.push(Category {
                name: article.category.clone(),
                count: 1,
            }),
        }
    }
    categories
}

/// Articles in one category, newest id first.
///
/// Exact label match wins; a case-insensitive match is only tried when the
/// exact match finds nothing.
///
/// # Arguments
///
/// * `articles` - All articles of the current partition
/// * `name` - The requested category label, usually the `type` query value
///
/// # Returns
///
/// The matching articles sorted by [`compare_ids_desc`], or an empty vector
/// when neither match finds anything.
///
/// # Examples
///
/// ```ignore
/// let selected = select_by_category(&part.articles, "tech");
/// let ids: Vec<_> = selected.iter().map(|a| a.id.as_str()).collect();
/// assert_eq!(ids, vec!["30", "10", "2"]);
/// ```
pub fn select_by_category<'a>(articles: &'a [ArticleRecord], name: &str) -> Vec<&'a ArticleRecord> {
    let name = name.trim();
    let mut selected: Vec<&ArticleRecord> = articles.iter().filter(|a| a.category == name).collect();
    if selected.is_empty() {
        let wanted = name.to_lowercase();
        selected = articles
            .iter()
            .filter(|a| a.category.to_lowercase() == wanted)
            .collect();
    }
    selected.sort_by(|a, b| compare_ids_desc(&a.id, &b.id));
    selected
}

pub fn find_article<'a>(articles: &'a [ArticleRecord], id: &str) -> Option<&'a ArticleRecord> {
    let id = id.trim();
    articles.iter().find(|a| a.id == id)
}

/// Descending id order: numeric ids by value, ahead of non-numeric ids,
/// which compare as strings. Equal values fall back to the string form.
pub fn compare_ids_desc(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => y.cmp(&x).then_with(|| b.cmp(a)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => b.cmp(a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SAMPLE_FEED;
    use serde_json::json;

    fn payload(v: Value) -> FeedPayload {
        serde_json::from_value(v).unwrap()
    }

    fn article(id: &str, category: &str) -> ArticleRecord {
        ArticleRecord {
            id: id.to_string(),
            title: format!("Article {id}"),
            category: category.to_string(),
            created_at: None,
            image: None,
            content: Vec::new(),
        }
    }

    #[test]
    fn test_sample_feed_partition() {
        let payload = FeedPayload::from_json(SAMPLE_FEED).unwrap();
        let part = partition(&payload, &OrderFields::default(), None);

        assert_eq!(part.articles.len(), 2);
        assert_eq!(
            part.categories,
            vec![
                Category { name: "Tech".into(), count: 1 },
                Category { name: "Life".into(), count: 1 },
            ]
        );
        assert!(part.articles.iter().all(|a| a.title != "ignored"));
    }

    #[test]
    fn test_order_follows_metadata_not_first_seen() {
        let p = payload(json!([
            {"info1": ["Life", "Tech"]},
            {"id": "1", "type": "Tech"},
            {"id": "2", "type": "Life"},
            {"id": "3", "type": "Tech"}
        ]));
        let part = partition(&p, &OrderFields::default(), None);
        let names: Vec<_> = part.categories.iter().map(|c| (c.name.as_str(), c.count)).collect();
        assert_eq!(names, vec![("Life", 1), ("Tech", 2)]);
    }

    #[test]
    fn test_first_seen_order_without_ordering_field() {
        let p = payload(json!([
            {"title": "meta without order"},
            {"id": "1", "type": "Markets"},
            {"id": "2", "type": "Crypto"},
            {"id": "3", "type": "Markets"},
            {"id": "4", "type": "Funds"}
        ]));
        let part = partition(&p, &OrderFields::default(), None);
        let names: Vec<_> = part.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Markets", "Crypto", "Funds"]);
        assert_eq!(part.categories[0].count, 2);
    }

    #[test]
    fn test_ordered_names_without_articles_are_dropped() {
        let p = payload(json!([
            {"info2": ["Sports", "Tech", "Life"]},
            {"id": "1", "type": "Life"},
            {"id": "2", "type": "Tech"}
        ]));
        let part = partition(&p, &OrderFields::default(), None);
        let names: Vec<_> = part.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Tech", "Life"]);
    }

    #[test]
    fn test_unmatched_order_falls_back_to_first_seen() {
        let p = payload(json!([
            {"info1": ["Nothing", "Matches"]},
            {"id": "1", "type": "B"},
            {"id": "2", "type": "A"}
        ]));
        let part = partition(&p, &OrderFields::default(), None);
        let names: Vec<_> = part.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_order_fields_probed_in_priority_order() {
        let p = payload(json!([{"info3": ["C"], "info1": "not an array", "info2": ["B", "B", " ", 7]}]));
        assert_eq!(extract_category_order(&p, &OrderFields::default()), vec!["B"]);

        let custom = OrderFields::new(["info3", "info2"]);
        assert_eq!(extract_category_order(&p, &custom), vec!["C"]);

        let none = OrderFields::new(["tabs"]);
        assert!(extract_category_order(&p, &none).is_empty());
    }

    #[test]
    fn test_order_absent_for_non_object_metadata() {
        let p = payload(json!([["Tech"], {"id": "1", "type": "Tech"}]));
        assert!(extract_category_order(&p, &OrderFields::default()).is_empty());
        assert!(extract_category_order(&FeedPayload::default(), &OrderFields::default()).is_empty());
    }

    #[test]
    fn test_article_count_matches_truthy_ids() {
        let p = payload(json!([
            {"id": "meta-is-never-an-article"},
            {"id": "1"},
            {"id": ""},
            {"id": 0},
            {"id": 9, "type": "X"},
            {"type": "no id"},
            {"id": " "},
            {"id": true},
            {"id": false},
            null
        ]));
        let part = partition(&p, &OrderFields::default(), None);
        let ids: Vec<_> = part.articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "9", " ", "true"]);
        // Untyped article is kept but not grouped.
        assert_eq!(part.categories, vec![Category { name: "X".into(), count: 1 }]);
    }

    #[test]
    fn test_select_case_insensitive_fallback() {
        let articles = vec![article("1", "Tech"), article("2", "Life")];
        let selected = select_by_category(&articles, "tech");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "1");
    }

    #[test]
    fn test_select_prefers_exact_match() {
        let articles = vec![article("1", "tech"), article("2", "Tech"), article("3", "TECH")];
        let selected = select_by_category(&articles, "Tech");
        let ids: Vec<_> = selected.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);

        let selected = select_by_category(&articles, "tEcH");
        let ids: Vec<_> = selected.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);

        assert!(select_by_category(&articles, "Life").is_empty());
    }

    #[test]
    fn test_ids_sort_numerically_descending() {
        let articles = vec![article("10", "T"), article("2", "T"), article("30", "T")];
        let ids: Vec<_> = select_by_category(&articles, "T").iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["30", "10", "2"]);
    }

    #[test]
    fn test_compare_ids_mixed() {
        let mut ids = vec!["b", "7", "a7", "007", "12", "c"];
        ids.sort_by(|a, b| compare_ids_desc(a, b));
        assert_eq!(ids, vec!["12", "7", "007", "c", "b", "a7"]);
    }

    #[test]
    fn test_find_article() {
        let articles = vec![article("1", "T"), article("2", "T")];
        assert_eq!(find_article(&articles, "2").map(|a| a.id.as_str()), Some("2"));
        assert!(find_article(&articles, "3").is_none());
    }
}
