//! Per-client request admission.
//!
//! Fixed-window counter: a client's window restarts at `(count = 0, window_start = now)`
//! the first time it is looked at after the window has elapsed, so a client can fit up
//! to twice the limit into a short burst straddling a window boundary. This matches the
//! behaviour the service has always had and is kept deliberately.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info};

use crate::metrics::TRACKED_IDENTITIES;

// Rate limit record - tracks requests per identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub count: u32,
    pub window_start: i64, // epoch millis
}

/// Snapshot returned to callers and echoed in 429 responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    pub current: u32,
    pub limit: u32,
    pub remaining: u32,
    /// Epoch milliseconds at which the current window ends.
    pub reset: i64,
}

/// Source of "now" in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Storage for rate-limit records keyed by client identity.
///
/// Only `get` and `set` are required. `update` must apply its closure as one step
/// for a given identity; the default get-then-set is fine for single-threaded stores,
/// shared stores should override it.
pub trait RateLimitStore: Send + Sync {
    fn get(&self, identity: &str) -> Option<RateLimitRecord>;

    fn set(&self, identity: &str, record: RateLimitRecord);

    fn update(
        &self,
        identity: &str,
        apply: &mut dyn FnMut(Option<RateLimitRecord>) -> RateLimitRecord,
    ) -> RateLimitRecord {
        let record = apply(self.get(identity));
        self.set(identity, record);
        record
    }

    /// Drops records whose window started at or before `cutoff_ms`. Returns how many were removed.
    fn prune_before(&self, _cutoff_ms: i64) -> usize {
        0
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store. Updates run under the map's shard lock for the key.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: DashMap<String, RateLimitRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for InMemoryStore {
    fn get(&self, identity: &str) -> Option<RateLimitRecord> {
        self.records.get(identity).map(|r| *r)
    }

    fn set(&self, identity: &str, record: RateLimitRecord) {
        self.records.insert(identity.to_string(), record);
    }

    fn update(
        &self,
        identity: &str,
        apply: &mut dyn FnMut(Option<RateLimitRecord>) -> RateLimitRecord,
    ) -> RateLimitRecord {
        match self.records.entry(identity.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                let record = apply(Some(*entry.get()));
                entry.insert(record);
                record
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let record = apply(None);
                entry.insert(record);
                record
            }
        }
    }

    fn prune_before(&self, cutoff_ms: i64) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| record.window_start > cutoff_ms);
        before.saturating_sub(self.records.len())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
    limit: u32,     // max requests allowed
    window_ms: i64, // duration of a window
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::with_parts(limit, window, Arc::new(InMemoryStore::new()), Arc::new(SystemClock))
    }

    pub fn with_parts(
        limit: u32,
        window: Duration,
        store: Arc<dyn RateLimitStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            clock,
            limit,
            window_ms: window.as_millis() as i64,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    // Fresh record when there is none or its window has elapsed
    fn current_record(&self, existing: Option<RateLimitRecord>, now: i64) -> RateLimitRecord {
        match existing {
            Some(record) if now - record.window_start < self.window_ms => record,
            _ => RateLimitRecord {
                count: 0,
                window_start: now,
            },
        }
    }

    fn status_of(&self, record: &RateLimitRecord) -> RateLimitStatus {
        RateLimitStatus {
            current: record.count,
            limit: self.limit,
            remaining: self.limit.saturating_sub(record.count),
            reset: record.window_start + self.window_ms,
        }
    }

    /// Current standing of `identity`. Never changes the count; an elapsed window
    /// is reset and stored as a side effect.
    pub fn status(&self, identity: &str) -> RateLimitStatus {
        let now = self.clock.now_ms();
        let record = self
            .store
            .update(identity, &mut |existing: Option<RateLimitRecord>| {
                self.current_record(existing, now)
            });
        TRACKED_IDENTITIES.set(self.store.len() as f64);
        self.status_of(&record)
    }

    /// Counts one request against `identity`. Returns `false`, leaving the count
    /// untouched, when the window is already full.
    pub fn try_increment(&self, identity: &str) -> bool {
        let now = self.clock.now_ms();
        let mut admitted = false;
        self.store.update(identity, &mut |existing: Option<RateLimitRecord>| {
            let mut record = self.current_record(existing, now);
            if record.count < self.limit {
                record.count += 1;
                admitted = true;
            }
            record
        });
        TRACKED_IDENTITIES.set(self.store.len() as f64);

        if admitted {
            debug!(identity, "request admitted");
        } else {
            info!(identity, limit = self.limit, "rate limit exceeded");
        }
        admitted
    }

    /// Removes records whose window has elapsed. Invisible to callers: an expired
    /// record and a missing one produce the same status.
    pub fn prune_expired(&self) -> usize {
        let cutoff = self.clock.now_ms() - self.window_ms;
        let removed = self.store.prune_before(cutoff);
        TRACKED_IDENTITIES.set(self.store.len() as f64);
        removed
    }

    pub fn tracked_identities(&self) -> usize {
        self.store.len()
    }
}

// Sweeper - prunes expired records on a fixed interval
pub async fn sweep_expired(limiter: Arc<RateLimiter>, every: Duration) {
    let mut interval = interval(every);

    info!(?every, "rate limit sweeper started");

    loop {
        interval.tick().await;

        let removed = limiter.prune_expired();
        if removed > 0 {
            debug!(
                removed,
                remaining = limiter.tracked_identities(),
                "pruned expired rate limit records"
            );
        }
    }
}
