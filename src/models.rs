//! Data models for the remote feed and the views derived from it.
//!
//! - [`FeedPayload`]: the raw JSON array as delivered by the endpoint
//! - [`ArticleRecord`]: one content item lifted out of the payload
//! - [`Category`]: a derived grouping of articles by their `type` label
//! - [`CachedSnapshot`]: the last good payload, as read back from storage
//!
//! Feed records are loosely typed. Field names vary between site copies, ids
//! may be strings or numbers, and timestamps may be seconds or milliseconds,
//! so records are read out of [`serde_json::Value`] rather than derived.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Timestamps at or above this are taken to be unix milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

const TIMESTAMP_FIELDS: &[&str] = &["create_time", "createTime", "addtime", "time", "created_at"];
const IMAGE_FIELDS: &[&str] = &["img", "image", "pic", "thumb"];

/// The top-level JSON array returned by the feed endpoint.
///
/// Element 0 is the metadata record; elements 1.. are candidate articles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedPayload {
    elements: Vec<Value>,
}

impl FeedPayload {
    /// Parse a response body. Anything other than a JSON array is rejected.
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    /// Element 0, if the payload has one.
    pub fn metadata(&self) -> Option<&Value> {
        self.elements.first()
    }

    /// Everything after the metadata element.
    pub fn records(&self) -> &[Value] {
        self.elements.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }
}

/// One content item from the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    /// Non-empty identifier, unique within a payload.
    pub id: String,
    pub title: String,
    /// The category label (`type` in the feed).
    pub category: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Absolute image URL, or the raw reference when no base URL is configured.
    pub image: Option<String>,
    /// Raw HTML-ish content blocks, unsanitised.
    pub content: Vec<String>,
}

impl ArticleRecord {
    /// Lift a payload element into an article.
    ///
    /// Returns `None` unless the element is an object with a truthy `id`.
    pub fn from_value(value: &Value, image_base: Option<&Url>) -> Option<Self> {
        let obj = value.as_object()?;
        let id = truthy_id(obj.get("id")?)?;

        let title = obj.get("title").and_then(scalar_string).unwrap_or_default();
        let category = obj
            .get("type")
            .and_then(scalar_string)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let created_at = TIMESTAMP_FIELDS
            .iter()
            .find_map(|f| obj.get(*f).and_then(parse_timestamp));
        let image = IMAGE_FIELDS
            .iter()
            .find_map(|f| obj.get(*f).and_then(Value::as_str))
            .and_then(|raw| resolve_image(raw, image_base));
        let content = match obj.get("content") {
            Some(Value::Array(blocks)) => blocks
                .iter()
                .filter_map(|b| b.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        };

        Some(Self {
            id,
            title,
            category,
            created_at,
            image,
            content,
        })
    }
}

/// A derived grouping of articles sharing one `type` label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub count: usize,
}

/// The last good payload read back from local storage.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSnapshot {
    pub payload: FeedPayload,
    pub saved_at: DateTime<Utc>,
}

/// An id is truthy when it is a non-empty string, a non-zero number or `true`.
///
/// Strings are kept verbatim; placeholder-looking ids are still articles and
/// only lose their detail link.
fn truthy_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a unix timestamp, guessing seconds vs milliseconds by magnitude.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    if raw <= 0 {
        return None;
    }
    if raw >= MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(raw)
    } else {
        DateTime::from_timestamp(raw, 0)
    }
}

/// Compose an image reference into an absolute URL where possible.
pub fn resolve_image(raw: &str, base: Option<&Url>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if Url::parse(raw).is_ok() {
        return Some(raw.to_string());
    }
    if let Some(rest) = raw.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    match base {
        Some(base) => base.join(raw).ok().map(|u| u.to_string()),
        None => Some(raw.to_string()),
    }
}
