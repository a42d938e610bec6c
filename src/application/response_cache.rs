// Time-windowed response cache over a data source
use crate::application::data_source::{DataSource, FetchError};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Millisecond wall clock, injectable for tests.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Envelope handed to callers; cache entries themselves never leave the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub data: Value,
    /// Epoch milliseconds at which `data` was fetched.
    pub timestamp: i64,
    pub cached: bool,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    fetched_at: i64,
}

/// Memoizes fetches by URL for a caller-chosen freshness window.
///
/// Failures never touch existing entries, and an expired entry is never
/// served in place of a failed fetch. Concurrent misses for the same URL
/// each reach the network.
pub struct ResponseCache {
    source: Arc<dyn DataSource>,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(source: Arc<dyn DataSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached payload for `url` if it is younger than `ttl_ms`,
    /// otherwise fetch it and replace the entry. A zero window always fetches.
    pub async fn fetch(&self, url: &str, ttl_ms: u64) -> Result<ApiResponse, FetchError> {
        let now = self.clock.now_millis();

        let existing = if ttl_ms == 0 {
            None
        } else {
            self.entries.read().await.get(url).cloned()
        };

        if let Some(entry) = existing {
            // A negative age means the wall clock stepped back; treat as expired.
            let age = now.saturating_sub(entry.fetched_at);
            if (0..i64::try_from(ttl_ms).unwrap_or(i64::MAX)).contains(&age) {
                tracing::debug!(url, age_ms = age, "cache hit");
                return Ok(ApiResponse {
                    data: entry.payload,
                    timestamp: entry.fetched_at,
                    cached: true,
                });
            }
        }

        tracing::debug!(url, ttl_ms, "cache miss, fetching");
        let payload = match self.source.fetch_json(url).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(url, error = %e, "fetch failed");
                return Err(e);
            }
        };

        let fetched_at = self.clock.now_millis();
        self.entries.write().await.insert(
            url.to_string(),
            CacheEntry {
                payload: payload.clone(),
                fetched_at,
            },
        );

        Ok(ApiResponse {
            data: payload,
            timestamp: fetched_at,
            cached: false,
        })
    }

    /// Check that a URL answers, without consulting the cache.
    pub async fn validate_url(&self, url: &str) -> bool {
        self.fetch(url, 0).await.is_ok()
    }

    pub async fn invalidate(&self, url: &str) -> bool {
        self.entries.write().await.remove(url).is_some()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct ManualClock(AtomicI64);

    impl ManualClock {
        pub fn set(&self, millis: i64) {
            self.0.store(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_millis(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    /// Data source that replays scripted results and counts calls.
    /// Once the script is exhausted it answers with `fallback`.
    pub struct ScriptedSource {
        calls: AtomicUsize,
        script: Mutex<VecDeque<Result<Value, FetchError>>>,
        fallback: Value,
    }

    impl ScriptedSource {
        pub fn new(fallback: Value) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                script: Mutex::new(VecDeque::new()),
                fallback,
            }
        }

        pub fn push(&self, result: Result<Value, FetchError>) {
            self.script.lock().unwrap().push_back(result);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DataSource for ScriptedSource {
        async fn fetch_json(&self, _url: &str) -> Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(self.fallback.clone()))
        }
    }
}
