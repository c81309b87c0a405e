//! Retry and fallback around the feed cache.
//!
//! ```text
//! Loading ──ok──────────────────────────────► Rendered
//!    │
//!    └─fail─► Retrying(n) ──(n < max)──► Loading
//!                 │
//!                 └─(n == max)─► FallbackLoad ──snapshot with articles──► CacheRendered
//!                                     │
//!                                     └─otherwise──► DefaultRendered
//! ```
//!
//! Network errors, bad status codes, unparseable bodies and payloads with no
//! usable articles all count the same against the attempt budget. The delay
//! after failed attempt `n` is `n × base_delay`.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::error::FeedError;
use crate::fetcher::{FeedCache, FeedTransport};
use crate::models::FeedPayload;
use crate::processor::{self, OrderFields, Partition};
use crate::storage::SnapshotStore;

/// Bounded retries with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Pause after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Where the controller is in its load sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Retrying { attempt: u32 },
    FallbackLoad,
    Rendered,
    CacheRendered,
    DefaultRendered,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Fresh data from the feed.
    Live(Partition),
    /// Data from the stored snapshot; the page should say so.
    Stale {
        partition: Partition,
        saved_at: DateTime<Utc>,
    },
    /// Nothing to show; render the static empty state with a refresh action.
    Default { last_error: Option<FeedError> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub outcome: LoadOutcome,
    /// Live attempts made before settling.
    pub attempts: u32,
}

impl LoadReport {
    pub fn state(&self) -> LoadState {
        match self.outcome {
            LoadOutcome::Live(_) => LoadState::Rendered,
            LoadOutcome::Stale { .. } => LoadState::CacheRendered,
            LoadOutcome::Default { .. } => LoadState::DefaultRendered,
        }
    }

    pub fn partition(&self) -> Option<&Partition> {
        match &self.outcome {
            LoadOutcome::Live(p) | LoadOutcome::Stale { partition: p, .. } => Some(p),
            LoadOutcome::Default { .. } => None,
        }
    }
}

/// Drives fetch, partition, snapshot and fallback for one site.
pub struct PageController<T, S> {
    cache: FeedCache<T>,
    store: S,
    policy: RetryPolicy,
    order_fields: OrderFields,
    image_base: Option<Url>,
    /// The payload last written to the store, to tell fresh fetches from memo hits.
    last_saved: Mutex<Option<Arc<FeedPayload>>>,
}

impl<T: FeedTransport, S: SnapshotStore> PageController<T, S> {
    pub fn new(
        cache: FeedCache<T>,
        store: S,
        policy: RetryPolicy,
        order_fields: OrderFields,
        image_base: Option<Url>,
    ) -> Self {
        Self {
            cache,
            store,
            policy,
            order_fields,
            image_base,
            last_saved: Mutex::new(None),
        }
    }

    /// Run the load sequence from `Loading` until a render state is reached.
    ///
    /// Each attempt resolves the payload through the cache and partitions it.
    /// A failed attempt `n` is followed by a pause of `n × base_delay`, except
    /// after the last one. The snapshot is written only when a payload came
    /// fresh from the network, never for a memoised one.
    ///
    /// # Returns
    ///
    /// A [`LoadReport`] that is one of:
    /// - [`LoadOutcome::Live`] when an attempt produced articles
    /// - [`LoadOutcome::Stale`] when every attempt failed and the stored
    ///   snapshot still has articles
    /// - [`LoadOutcome::Default`] otherwise, carrying the last attempt's error
    ///
    /// This never fails; storage errors are swallowed by the store.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let report = controller.load().await;
    /// let html = pages::render_route(&route, &report, "News");
    /// ```
    #[instrument(level = "info", skip_all, fields(url = %self.cache.url()))]
    pub async fn load(&self) -> LoadReport {
        let t0 = Instant::now();
        let max = self.policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max {
            debug!(attempt, state = ?LoadState::Loading, "Loading feed");
            match self.attempt().await {
                Ok((payload, partition)) => {
                    if self.mark_saved(&payload) {
                        self.store.save(&payload).await;
                    } else {
                        debug!("Payload served from memory; snapshot left as is");
                    }
                    info!(
                        attempt,
                        articles = partition.articles.len(),
                        categories = partition.categories.len(),
                        elapsed_ms = t0.elapsed().as_millis(),
                        state = ?LoadState::Rendered,
                        "Feed loaded"
                    );
                    return LoadReport {
                        outcome: LoadOutcome::Live(partition),
                        attempts: attempt,
                    };
                }
                Err(e) if attempt < max => {
                    let delay = self.policy.delay_after(attempt);
                    let state = LoadState::Retrying { attempt };
                    warn!(
                        attempt,
                        max,
                        ?delay,
                        error = %e,
                        ?state,
                        "Feed load failed; backing off"
                    );
                    last_error = Some(e);
                    sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        attempt,
                        max,
                        elapsed_ms = t0.elapsed().as_millis(),
                        error = %e,
                        "Feed load exhausted retries"
                    );
                    last_error = Some(e);
                }
            }
        }

        debug!(state = ?LoadState::FallbackLoad, "Falling back to stored snapshot");
        if let Some(snapshot) = self.store.load().await {
            let partition = processor::partition(
                &snapshot.payload,
                &self.order_fields,
                self.image_base.as_ref(),
            );
            if !partition.is_empty() {
                warn!(
                    saved_at = %snapshot.saved_at,
                    articles = partition.articles.len(),
                    state = ?LoadState::CacheRendered,
                    "Rendering stale snapshot"
                );
                return LoadReport {
                    outcome: LoadOutcome::Stale {
                        partition,
                        saved_at: snapshot.saved_at,
                    },
                    attempts: max,
                };
            }
            debug!("Stored snapshot has no articles");
        }

        warn!(state = ?LoadState::DefaultRendered, "No content available; rendering default state");
        LoadReport {
            outcome: LoadOutcome::Default { last_error },
            attempts: max,
        }
    }

    /// Manual refresh: forget the memoised payload and start over.
    pub async fn refresh(&self) -> LoadReport {
        info!(url = %self.cache.url(), "Manual refresh requested");
        self.cache.invalidate();
        self.load().await
    }

    async fn attempt(&self) -> Result<(Arc<FeedPayload>, Partition), FeedError> {
        let payload = self.cache.get_payload().await?;
        let partition = processor::partition(&payload, &self.order_fields, self.image_base.as_ref());
        if partition.is_empty() {
            // Memoised, this payload would be served again on every retry.
            self.cache.invalidate();
            return Err(FeedError::EmptyDataset);
        }
        Ok((payload, partition))
    }

    /// Record `payload` as the latest snapshot. `false` when it already was.
    fn mark_saved(&self, payload: &Arc<FeedPayload>) -> bool {
        let mut last = self.last_saved.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_ref().is_some_and(|p| Arc::ptr_eq(p, payload)) {
            return false;
        }
        *last = Some(Arc::clone(payload));
        true
    }
}
