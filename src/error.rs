//! Error types for the feed pipeline.
//!
//! - [`FetchError`]: anything that goes wrong getting a usable payload off the
//!   wire. Cloneable, because one failed request is handed to every caller
//!   that was waiting on it.
//! - [`FeedError`]: what the retry controller counts against its budget.
//! - [`StorageError`]: snapshot store failures. These never leave the store.
//! - [`ConfigError`]: site configuration problems, fatal at startup.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("feed endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed feed body: {0}")]
    MalformedBody(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => FetchError::Status {
                status: status.as_u16(),
            },
            None => FetchError::Network(e.to_string()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("feed contained no usable articles")]
    EmptyDataset,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid snapshot timestamp: {0:?}")]
    InvalidTimestamp(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
