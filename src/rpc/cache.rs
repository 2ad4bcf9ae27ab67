//! Short-lived cache of upstream responses.

use axum::http::{Method, StatusCode};
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use futures_util::{ready, Stream};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use crate::observability::metrics;

/// Default upper bound on stored entries.
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Default upper bound on a single stored body.
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Identity of a cacheable upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub method: Method,
    pub endpoint: String,
    pub body: Bytes,
}

/// A stored upstream response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

#[derive(Debug)]
struct Entry {
    response: CachedResponse,
    stored_at: Instant,
}

/// A thread-safe TTL cache keyed by (method, endpoint, body).
///
/// Holds at most `max_entries` responses, each no larger than
/// `max_body_bytes`. When full, expired entries go first, then the oldest.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    max_entries: usize,
    max_body_bytes: usize,
    entries: DashMap<CacheKey, Entry>,
}

impl ResponseCache {
    /// Create an empty cache whose entries live for `ttl`, with default bounds.
    pub fn new(ttl: Duration) -> Self {
        Self::with_limits(ttl, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_BODY_BYTES)
    }

    pub fn with_limits(ttl: Duration, max_entries: usize, max_body_bytes: usize) -> Self {
        Self {
            ttl,
            max_entries,
            max_body_bytes,
            entries: DashMap::new(),
        }
    }

    /// Largest body the cache will store.
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a fresh response. Expired entries are evicted.
    pub fn get(&self, key: &CacheKey) -> Option<CachedResponse> {
        // The shard guard must be released before any removal.
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (entry.stored_at.elapsed() < self.ttl, entry.response.clone()));

        let result = match lookup {
            Some((true, response)) => Some(response),
            Some((false, _)) => {
                self.entries
                    .remove_if(key, |_, entry| entry.stored_at.elapsed() >= self.ttl);
                None
            }
            None => None,
        };

        metrics::record_cache_lookup(result.is_some());
        result
    }

    /// Store a response. Only successful responses within the size bound
    /// are accepted.
    pub fn insert(&self, key: CacheKey, response: CachedResponse) {
        if !response.status.is_success() || response.body.len() > self.max_body_bytes {
            return;
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.purge_expired();
            while self.entries.len() >= self.max_entries {
                if !self.evict_oldest() {
                    break;
                }
            }
        }

        self.entries.insert(
            key,
            Entry {
                response,
                stored_at: Instant::now(),
            },
        );
    }

    fn evict_oldest(&self) -> bool {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.stored_at)
            .map(|entry| entry.key().clone());

        match oldest {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Body stream that forwards upstream chunks untouched and stores the
/// complete body once the stream ends cleanly.
///
/// Buffering stops, and nothing is stored, if the body outgrows the cache's
/// size bound or the stream fails.
pub struct CachingStream<S> {
    inner: S,
    cache: Arc<ResponseCache>,
    pending: Option<(CacheKey, StatusCode, BytesMut)>,
}

impl<S> CachingStream<S> {
    pub fn new(inner: S, cache: Arc<ResponseCache>, key: CacheKey, status: StatusCode) -> Self {
        Self {
            inner,
            cache,
            pending: Some((key, status, BytesMut::new())),
        }
    }
}

impl<S, E> Stream for CachingStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let item = ready!(Pin::new(&mut this.inner).poll_next(cx));

        match &item {
            Some(Ok(chunk)) => {
                let limit = this.cache.max_body_bytes();
                let overflow = match &mut this.pending {
                    Some((_, _, buf)) if buf.len() + chunk.len() <= limit => {
                        buf.extend_from_slice(chunk);
                        false
                    }
                    Some(_) => true,
                    None => false,
                };
                if overflow {
                    this.pending = None;
                }
            }
            Some(Err(_)) => this.pending = None,
            None => {
                if let Some((key, status, buf)) = this.pending.take() {
                    this.cache.insert(
                        key,
                        CachedResponse {
                            status,
                            body: buf.freeze(),
                        },
                    );
                }
            }
        }

        Poll::Ready(item)
    }
}
