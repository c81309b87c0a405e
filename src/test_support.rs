//! In-memory doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::FetchError;
use crate::fetcher::FeedTransport;
use crate::models::{CachedSnapshot, FeedPayload};
use crate::storage::SnapshotStore;

pub const SAMPLE_FEED: &str = r#"[
    {"info1": ["Tech", "Life"]},
    {"id": "5", "type": "Tech", "title": "A", "create_time": 1700000000, "img": "a.jpg", "content": ["<p>Alpha &amp; more</p>"]},
    {"id": "3", "type": "Life", "title": "B", "create_time": 1700000500000},
    {"id": "", "type": "Tech", "title": "ignored"}
]"#;

/// Transport that replays scripted responses, then a fixed fallback.
pub struct MockTransport {
    calls: Arc<AtomicUsize>,
    script: Mutex<VecDeque<Result<String, FetchError>>>,
    fallback: Result<String, FetchError>,
    delay: Duration,
}

impl MockTransport {
    pub fn always(response: Result<String, FetchError>) -> Self {
        Self::scripted(Vec::new(), response)
    }

    pub fn scripted(
        responses: Vec<Result<String, FetchError>>,
        then: Result<String, FetchError>,
    ) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            script: Mutex::new(responses.into()),
            fallback: then,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Handle on the call counter that outlives the transport being moved.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl FeedTransport for MockTransport {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Snapshot store backed by a mutex, counting saves.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<CachedSnapshot>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn with_snapshot(payload: FeedPayload, saved_at: DateTime<Utc>) -> Self {
        Self {
            snapshot: Mutex::new(Some(CachedSnapshot { payload, saved_at })),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<CachedSnapshot> {
        self.snapshot.lock().unwrap().clone()
    }
}

impl SnapshotStore for MemoryStore {
    async fn save(&self, payload: &FeedPayload) {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.snapshot.lock().unwrap() = Some(CachedSnapshot {
            payload: payload.clone(),
            saved_at: Utc::now(),
        });
    }

    async fn load(&self) -> Option<CachedSnapshot> {
        self.snapshot.lock().unwrap().clone()
    }
}
