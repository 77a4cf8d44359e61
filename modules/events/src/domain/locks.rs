use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-event async mutexes. Every write that reads and then changes an
/// event's occupancy holds the event's guard across the read and the write.
#[derive(Debug, Default)]
pub struct EventLocks {
    inner: DashMap<u64, Arc<Mutex<()>>>,
}

/// Guards held for a two-event write.
#[derive(Debug)]
pub struct PairGuard {
    _first: OwnedMutexGuard<()>,
    _second: Option<OwnedMutexGuard<()>>,
}

impl EventLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, event_id: u64) -> Arc<Mutex<()>> {
        self.inner.entry(event_id).or_default().clone()
    }

    pub async fn lock(&self, event_id: u64) -> OwnedMutexGuard<()> {
        self.handle(event_id).lock_owned().await
    }

    /// Locks both events in ascending id order; a single lock when they match.
    pub async fn lock_pair(&self, a: u64, b: u64) -> PairGuard {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let first = self.lock(lo).await;
        let second = if lo == hi {
            None
        } else {
            Some(self.lock(hi).await)
        };
        PairGuard {
            _first: first,
            _second: second,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.len()
    }
}
