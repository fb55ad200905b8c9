//! Retry attempt bookkeeping.
//!
//! Each [`RetryInterceptor`](crate::http::retry::RetryInterceptor) owns a
//! [`RetryStateStore`] mapping a [`RequestKey`] to the number of retries
//! already spent on it. Counters are reserved atomically through the
//! `DashMap` entry API, so concurrent identical requests can never push a
//! key past its limit. Idle entries are dropped by [`RetryStateStore::sweep_expired`].

use crate::http::request::RequestKey;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Default inactivity window after which an idle key is forgotten.
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy)]
struct RetryState {
    attempts: u32,
    last_access: Instant,
    /// Retry loops currently consulting this entry.
    active: u32,
}

impl RetryState {
    fn new(now: Instant) -> Self {
        Self {
            attempts: 0,
            last_access: now,
            active: 0,
        }
    }
}

/// Concurrent map of per-request retry counters with idle eviction.
#[derive(Debug, Clone)]
pub struct RetryStateStore {
    states: Arc<DashMap<RequestKey, RetryState>>,
    ttl: Duration,
}

impl Default for RetryStateStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_TTL)
    }
}

impl RetryStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            states: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Retries already spent on `key` (0 when untracked).
    pub fn attempts(&self, key: &RequestKey) -> u32 {
        self.states.get(key).map(|s| s.attempts).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Start tracking `key` for the duration of one retry loop.
    ///
    /// The entry is created if needed and pinned against eviction until the
    /// returned tracker is dropped or completed.
    pub fn track(&self, key: &RequestKey) -> RetryTracker {
        let now = Instant::now();
        let mut entry = self
            .states
            .entry(key.clone())
            .or_insert_with(|| RetryState::new(now));
        entry.active += 1;
        entry.last_access = now;
        drop(entry);

        RetryTracker {
            states: Arc::clone(&self.states),
            key: key.clone(),
            done: false,
        }
    }

    /// Forget `key` unless a retry loop is still consulting it.
    pub fn clear(&self, key: &RequestKey) {
        self.states.remove_if(key, |_, state| state.active == 0);
    }

    /// Drop entries idle for at least the TTL. Entries pinned by an active
    /// tracker are kept. Returns how many entries were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.states.len();
        self.states.retain(|key, state| {
            let keep = state.active > 0 || now.duration_since(state.last_access) < self.ttl;
            if !keep {
                tracing::debug!(key = %key, attempts = state.attempts, "evicting idle retry state");
            }
            keep
        });
        before.saturating_sub(self.states.len())
    }
}

/// Handle held by a retry loop while it consults a key.
#[derive(Debug)]
pub struct RetryTracker {
    states: Arc<DashMap<RequestKey, RetryState>>,
    key: RequestKey,
    done: bool,
}

impl RetryTracker {
    /// Reserve one retry for the key if fewer than `max_retry` have been
    /// spent. Returns the new attempt number (1-based).
    pub fn try_reserve(&self, max_retry: u32) -> Option<u32> {
        let now = Instant::now();
        let mut entry = self
            .states
            .entry(self.key.clone())
            .or_insert_with(|| RetryState {
                active: 1,
                ..RetryState::new(now)
            });
        entry.last_access = now;
        if entry.attempts < max_retry {
            entry.attempts += 1;
            Some(entry.attempts)
        } else {
            None
        }
    }

    pub fn attempts(&self) -> u32 {
        self.states.get(&self.key).map(|s| s.attempts).unwrap_or(0)
    }

    /// Release the key after a successful outcome: the entry is removed
    /// when no other loop is consulting it.
    pub fn complete(mut self) {
        self.done = true;
        let removed = self
            .states
            .remove_if(&self.key, |_, state| state.active <= 1)
            .is_some();
        if !removed {
            self.release();
        }
    }

    fn release(&self) {
        if let Some(mut state) = self.states.get_mut(&self.key) {
            state.active = state.active.saturating_sub(1);
            state.last_access = Instant::now();
        }
    }
}

impl Drop for RetryTracker {
    fn drop(&mut self) {
        if !self.done {
            self.release();
        }
    }
}
