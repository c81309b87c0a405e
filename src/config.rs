//! Site configuration.
//!
//! Settings come from an optional YAML file, then CLI flags / environment
//! variables override individual fields:
//!
//! ```yaml
//! feed_url: "https://api.example.com/articles?cids=3,5,8&limit=60"
//! image_base_url: "https://cdn.example.com/uploads/"
//! storage_dir: ".feed_cache"
//! order_fields: ["info1", "info2", "categories"]
//! max_attempts: 3
//! base_delay_ms: 1000
//! request_timeout_secs: 15
//! site_title: "Market Daily"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

use crate::cli::Cli;
use crate::controller::RetryPolicy;
use crate::error::ConfigError;
use crate::processor::OrderFields;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    pub feed_url: Option<String>,
    pub image_base_url: Option<String>,
    pub storage_dir: String,
    pub order_fields: OrderFields,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub site_title: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            feed_url: None,
            image_base_url: None,
            storage_dir: ".feed_cache".to_string(),
            order_fields: OrderFields::default(),
            max_attempts: retry.max_attempts,
            base_delay_ms: retry.base_delay.as_millis() as u64,
            request_timeout_secs: 15,
            site_title: "News".to_string(),
        }
    }
}

impl SiteConfig {
    #[instrument(level = "info")]
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let config: SiteConfig = serde_yaml::from_str(&raw)?;
        info!(path, "Loaded site configuration");
        Ok(config)
    }

    /// Overlay whatever the command line (or its env fallbacks) set.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.feed_url {
            self.feed_url = Some(url.clone());
        }
        if let Some(base) = &cli.image_base_url {
            self.image_base_url = Some(base.clone());
        }
        if let Some(dir) = &cli.storage_dir {
            self.storage_dir = dir.clone();
        }
        if let Some(n) = cli.max_attempts {
            self.max_attempts = n;
        }
        if let Some(ms) = cli.base_delay_ms {
            self.base_delay_ms = ms;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.feed_url()?;
        self.image_base()?;
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        if self.storage_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("storage_dir must not be empty".into()));
        }
        Ok(())
    }

    pub fn feed_url(&self) -> Result<Url, ConfigError> {
        let raw = self
            .feed_url
            .as_deref()
            .ok_or_else(|| ConfigError::Invalid("feed_url is required".into()))?;
        let url = Url::parse(raw)
            .map_err(|e| ConfigError::Invalid(format!("feed_url {raw:?}: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid(format!(
                "feed_url must be http or https, got {other}"
            ))),
        }
    }

    /// Base for relative image names. A trailing slash is added so that
    /// joining keeps the last path segment.
    pub fn image_base(&self) -> Result<Option<Url>, ConfigError> {
        let Some(raw) = self.image_base_url.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        let raw = raw.trim();
        let with_slash = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };
        Url::parse(&with_slash)
            .map(Some)
            .map_err(|e| ConfigError::Invalid(format!("image_base_url {raw:?}: {e}")))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
