//! crates/truthshield_core/src/cache.rs
//!
//! Time-bounded memoization of search results, shared process-wide.

use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::domain::{PageToken, SearchResult};

/// Everything that makes one provider response differ from another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub query: Option<String>,
    pub language_code: String,
    pub page_size: u32,
    pub cursor: Option<PageToken>,
}

impl CacheKey {
    pub fn new(
        query: Option<&str>,
        language_code: &str,
        page_size: u32,
        cursor: Option<&PageToken>,
    ) -> Self {
        Self {
            query: query.map(str::to_string),
            language_code: language_code.to_string(),
            page_size,
            cursor: cursor.cloned(),
        }
    }
}

struct CacheEntry {
    result: SearchResult,
    inserted_at: Instant,
}

/// Expiry is checked lazily on lookup; stale entries are dropped on the next insert.
///
/// Concurrent misses on the same key each fetch and the last write wins.
#[derive(Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored result when it is younger than `ttl`; otherwise awaits
    /// `fetch` once and stores whatever it produced, failures included.
    pub async fn get_or_fetch<F, Fut>(&self, key: CacheKey, ttl: Duration, fetch: F) -> SearchResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SearchResult>,
    {
        if let Some(hit) = self.get(&key, ttl) {
            return hit;
        }

        let result = fetch().await;
        self.insert(key, result.clone(), ttl);
        result
    }

    /// A live entry for `key`, if any.
    pub fn get(&self, key: &CacheKey, ttl: Duration) -> Option<SearchResult> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() >= ttl {
            return None;
        }
        Some(entry.result.clone())
    }

    fn insert(&self, key: CacheKey, result: SearchResult, ttl: Duration) {
        let mut entries = match self.entries.write() {
            Ok(e) => e,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        entries.insert(
            key,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of physically stored entries, live or not.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}
