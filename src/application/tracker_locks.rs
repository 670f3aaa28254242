//! TrackerLocks - per-tracker mutual exclusion for read-modify-write.
//!
//! Operations on the same tracker serialize; different trackers never
//! contend. Entries nobody holds or waits on are pruned on each acquire.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::TrackerId;

#[derive(Debug, Default)]
pub struct TrackerLocks {
    locks: Mutex<HashMap<TrackerId, Arc<Mutex<()>>>>,
}

impl TrackerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to a tracker.
    pub async fn acquire(&self, tracker_id: TrackerId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(locks.entry(tracker_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of tracked lock entries (held, awaited, or not yet pruned).
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_tracker_serializes() {
        let locks = Arc::new(TrackerLocks::new());
        let id = TrackerId::new();
        let guard = locks.acquire(id).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.acquire(id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_trackers_do_not_contend() {
        let locks = TrackerLocks::new();
        let _a = locks.acquire(TrackerId::new()).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.acquire(TrackerId::new())).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = TrackerLocks::new();
        drop(locks.acquire(TrackerId::new()).await);
        drop(locks.acquire(TrackerId::new()).await);

        // The second acquire pruned the first entry.
        assert_eq!(locks.len().await, 1);
        let _held = locks.acquire(TrackerId::new()).await;
        assert_eq!(locks.len().await, 1);
    }
}
