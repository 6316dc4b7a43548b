//! In-memory lock store
//!
//! Uses DashMap for thread-safe concurrent access. Suitable for a single
//! process or for testing the protocol without a live server. Expiry is
//! evaluated lazily against the Tokio clock, so tests running with a paused
//! clock control lease expiry deterministically.

use crate::error::StoreResult;
use crate::store::LockStore;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct Lease {
    value: String,
    /// `None` when stored with a zero TTL.
    expires_at: Option<Instant>,
}

impl Lease {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-memory lock store
#[derive(Debug, Default)]
pub struct MemoryStore {
    leases: DashMap<String, Lease>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        debug!("Creating new in-memory lock store");
        Self::default()
    }

    /// Get the live value stored at `key`, if any.
    pub fn value(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.leases
            .get(key)
            .filter(|lease| !lease.is_expired(now))
            .map(|lease| lease.value.clone())
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.leases.iter().filter(|l| !l.is_expired(now)).count()
    }

    /// Check whether the store holds no live keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.leases.retain(|_, lease| {
            let keep = !lease.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}

#[async_trait]
impl LockStore for MemoryStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let now = Instant::now();
        let lease = Lease {
            value: value.to_string(),
            expires_at: (!ttl.is_zero()).then(|| now + ttl),
        };

        let set = match self.leases.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(lease);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(lease);
                true
            }
        };

        trace!(key = %key, ttl = ?ttl, set, "Memory set-if-absent");
        Ok(set)
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> StoreResult<bool> {
        let now = Instant::now();
        let deleted = self
            .leases
            .remove_if(key, |_, lease| !lease.is_expired(now) && lease.value == expected)
            .is_some();

        trace!(key = %key, deleted, "Memory compare-and-delete");
        Ok(deleted)
    }

    fn store_type(&self) -> &'static str {
        "memory"
    }
}
