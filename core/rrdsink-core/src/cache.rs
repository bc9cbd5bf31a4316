//! Coalescing cache — keyed store of pending batches, one entry per archive
//! path.
//!
//! The cache serializes all writers behind a single lock, rejects
//! non-monotonic timestamps, and decides when a batch is old enough to hand
//! to the flush worker. Handoff is a pointer swap under the cache lock;
//! the worker never touches an entry's value list while the cache still
//! owns it.
//!
//! Lock ordering: the cache lock is always taken before the queue lock and
//! released after it. The periodic sweep enqueues while holding the cache
//! lock, so no other thread can observe a half-swept cache.

use crate::config::Config;
use crate::error::{RrdSinkError, RrdSinkResult};
use crate::queue::FlushQueue;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Flush state of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Accumulating; not on the flush queue.
    Idle,
    /// On the flush queue awaiting handoff.
    Queued,
}

/// Pending batch for one archive path.
///
/// `first_value_time`/`last_value_time` describe the batch while `values`
/// is non-empty; after a handoff they are retained so the monotonicity
/// guard and idle aging keep working across flushes.
#[derive(Debug)]
struct PendingBatch {
    values: Vec<String>,
    first_value_time: u64,
    last_value_time: u64,
    state: EntryState,
}

impl PendingBatch {
    fn new() -> Self {
        Self {
            values: Vec::new(),
            first_value_time: 0,
            last_value_time: 0,
            state: EntryState::Idle,
        }
    }
}

/// Read-only snapshot of one cache entry, for observability and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStats {
    pub values_num: usize,
    pub first_value_time: u64,
    pub last_value_time: u64,
    pub queued: bool,
}

struct CacheInner {
    entries: HashMap<String, PendingBatch>,
    /// Unix time of the last full sweep.
    flush_last: u64,
}

/// Write-coalescing cache guarding monotonicity and batch handoff.
pub struct WriteCache {
    inner: Mutex<CacheInner>,
    queue: Arc<FlushQueue>,
    cache_timeout: u64,
    cache_flush_timeout: u64,
}

impl WriteCache {
    pub fn new(config: &Config, queue: Arc<FlushQueue>) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                flush_last: unix_now(),
            }),
            queue,
            cache_timeout: config.cache_timeout,
            cache_flush_timeout: config.cache_flush_timeout,
        }
    }

    /// Append one formatted update line to the batch for `path`.
    ///
    /// Creates the entry on first use. Rejects timestamps that are not
    /// strictly newer than the last accepted one without mutating the entry.
    /// Queues the batch once it spans the cache timeout, and runs the
    /// periodic aging sweep when it is due.
    pub fn insert(&self, path: &str, line: String, value_time: u64) -> RrdSinkResult<()> {
        self.insert_at(path, line, value_time, unix_now())
    }

    pub(crate) fn insert_at(
        &self,
        path: &str,
        line: String,
        value_time: u64,
        now: u64,
    ) -> RrdSinkResult<()> {
        let mut inner = self.inner.lock();

        let entry = inner
            .entries
            .entry(path.to_string())
            .or_insert_with(PendingBatch::new);

        if value_time <= entry.last_value_time {
            let last = entry.last_value_time;
            drop(inner);
            warn!(
                file = path,
                value_time, last, "dropping sample with non-monotonic timestamp"
            );
            return Err(RrdSinkError::NonMonotonic {
                file: path.to_string(),
                value_time,
                last,
            });
        }

        if entry.values.is_empty() {
            entry.first_value_time = value_time;
        }
        entry.last_value_time = value_time;
        entry.values.push(line);

        if entry.state == EntryState::Idle
            && entry.last_value_time - entry.first_value_time >= self.cache_timeout
            && self.queue.push(path.to_string())
        {
            entry.state = EntryState::Queued;
        }

        if self.cache_timeout > 0
            && now.saturating_sub(inner.flush_last) > self.cache_flush_timeout
        {
            Self::sweep_locked(&mut inner, &self.queue, self.cache_flush_timeout as i64, now);
        }

        Ok(())
    }

    /// Queue every non-queued batch older than `deadline` seconds and drop
    /// idle empty entries past it. A negative deadline force-queues
    /// everything (the shutdown sweep).
    pub fn flush(&self, deadline: i64) {
        self.flush_at(deadline, unix_now());
    }

    pub(crate) fn flush_at(&self, deadline: i64, now: u64) {
        let mut inner = self.inner.lock();
        Self::sweep_locked(&mut inner, &self.queue, deadline, now);
    }

    /// Targeted flush of a single archive path.
    ///
    /// Queued entries and batches younger than `deadline` are left alone.
    /// Unknown paths are reported so the host can tell the requester.
    pub fn flush_identifier(&self, path: &str, deadline: i64) -> RrdSinkResult<()> {
        self.flush_identifier_at(path, deadline, unix_now())
    }

    pub(crate) fn flush_identifier_at(
        &self,
        path: &str,
        deadline: i64,
        now: u64,
    ) -> RrdSinkResult<()> {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.entries.get_mut(path) else {
            return Err(RrdSinkError::NotCached(path.to_string()));
        };

        if entry.state == EntryState::Queued || entry.values.is_empty() {
            return Ok(());
        }
        if (now as i64).saturating_sub(entry.first_value_time as i64) < deadline {
            return Ok(());
        }

        if self.queue.push(path.to_string()) {
            entry.state = EntryState::Queued;
            Ok(())
        } else {
            Err(RrdSinkError::QueueClosed)
        }
    }

    /// Handoff: swap the pending value list out and return the entry to
    /// idle. The timestamps stay behind so monotonicity survives the flush.
    ///
    /// Returns `None` for unknown paths; the queue invariant makes that
    /// unreachable unless the cache was cleared underneath the worker.
    pub fn take_batch(&self, path: &str) -> Option<Vec<String>> {
        let mut inner = self.inner.lock();
        let entry = inner.entries.get_mut(path)?;
        entry.state = EntryState::Idle;
        Some(std::mem::take(&mut entry.values))
    }

    /// Drop every entry. Called by the worker as its final act.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Number of archive paths currently cached.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Snapshot of one entry, if present.
    pub fn stats(&self, path: &str) -> Option<BatchStats> {
        let inner = self.inner.lock();
        inner.entries.get(path).map(|entry| BatchStats {
            values_num: entry.values.len(),
            first_value_time: entry.first_value_time,
            last_value_time: entry.last_value_time,
            queued: entry.state == EntryState::Queued,
        })
    }

    fn sweep_locked(inner: &mut CacheInner, queue: &FlushQueue, deadline: i64, now: u64) {
        let mut stale = Vec::new();

        for (path, entry) in inner.entries.iter_mut() {
            if entry.state == EntryState::Queued {
                continue;
            }
            if (now as i64).saturating_sub(entry.first_value_time as i64) < deadline {
                continue;
            }
            if !entry.values.is_empty() {
                if queue.push(path.clone()) {
                    entry.state = EntryState::Queued;
                }
            } else {
                stale.push(path.clone());
            }
        }

        for path in stale {
            inner.entries.remove(&path);
        }
        inner.flush_last = now;
    }
}

/// Wall-clock unix seconds.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
