//! Feed transport and the single-flight payload cache.
//!
//! - [`FeedTransport`]: one HTTP GET against the feed URL, body as text
//! - [`HttpTransport`]: the `reqwest` implementation
//! - [`FeedCache`]: memoises the parsed payload for its lifetime and folds
//!   concurrent callers onto one in-flight request
//!
//! # Cache States
//!
//! | payload | in-flight | `get_payload()` |
//! |---------|-----------|-----------------|
//! | `Some`  | -         | returns the memoised payload, no request |
//! | `None`  | `Some`    | awaits the shared request |
//! | `None`  | `None`    | starts a request and publishes it as in-flight |
//!
//! A failed request clears the in-flight marker so the next call goes back to
//! the network; every caller that was waiting on it gets the same error.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::error::FetchError;
use crate::models::FeedPayload;
use crate::utils::{looks_truncated, truncate_for_log};

/// Something that can GET the feed body.
pub trait FeedTransport: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// [`FeedTransport`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl FeedTransport for HttpTransport {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), elapsed_ms = t0.elapsed().as_millis(), "Feed request rejected");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        info!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Fetched feed body"
        );
        Ok(body)
    }
}

type PendingFetch = Shared<BoxFuture<'static, Result<Arc<FeedPayload>, FetchError>>>;

#[derive(Default)]
struct CacheState {
    payload: Option<Arc<FeedPayload>>,
    in_flight: Option<(u64, PendingFetch)>,
    generation: u64,
}

/// Memoising, de-duplicating accessor for one feed URL.
pub struct FeedCache<T> {
    url: String,
    transport: Arc<T>,
    state: Mutex<CacheState>,
}

impl<T: FeedTransport> FeedCache<T> {
    pub fn new(url: impl Into<String>, transport: T) -> Self {
        Self {
            url: url.into(),
            transport: Arc::new(transport),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Resolve the feed payload, hitting the network at most once per
    /// successful resolution.
    pub async fn get_payload(&self) -> Result<Arc<FeedPayload>, FetchError> {
        let (generation, pending) = {
            let mut state = self.lock();
            if let Some(payload) = &state.payload {
                debug!("Serving memoised feed payload");
                return Ok(Arc::clone(payload));
            }
            let joined = state
                .in_flight
                .as_ref()
                .map(|(generation, pending)| (*generation, pending.clone()));
            match joined {
                Some((generation, pending)) => {
                    debug!(generation, "Joining in-flight feed request");
                    (generation, pending)
                }
                None => {
                    state.generation += 1;
                    let generation = state.generation;
                    let pending = self.start_fetch();
                    state.in_flight = Some((generation, pending.clone()));
                    debug!(generation, "Started feed request");
                    (generation, pending)
                }
            }
        };

        let result = pending.await;

        let mut state = self.lock();
        if matches!(&state.in_flight, Some((g, _)) if *g == generation) {
            state.in_flight = None;
            if let Ok(payload) = &result {
                state.payload = Some(Arc::clone(payload));
            }
        }
        result
    }

    /// Forget the memoised payload so the next call refetches.
    ///
    /// A request already in flight is left to finish.
    pub fn invalidate(&self) {
        if self.lock().payload.take().is_some() {
            debug!(url = %self.url, "Dropped memoised feed payload");
        }
    }

    fn start_fetch(&self) -> PendingFetch {
        let transport = Arc::clone(&self.transport);
        let url = self.url.clone();
        async move {
            let body = transport.fetch(&url).await?;
            let payload = FeedPayload::from_json(&body).map_err(|e| {
                warn!(
                    error = %e,
                    truncated = looks_truncated(&e),
                    body_preview = %truncate_for_log(&body, 200),
                    "Feed body is not a JSON array"
                );
                FetchError::MalformedBody(e.to_string())
            })?;
            info!(elements = payload.len(), "Feed payload resolved");
            Ok(Arc::new(payload))
        }
        .boxed()
        .shared()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
