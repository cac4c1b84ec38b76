use crate::core::StockKey;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per stock key.
///
/// Callers holding the guard for a key are the only writers of that key;
/// guards for different keys never contend. A key's mutex is dropped from the
/// map once its last holder or waiter lets go.
#[derive(Default)]
pub struct KeyLocks {
    locks: DashMap<StockKey, Arc<Mutex<()>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &StockKey) -> KeyGuard<'_> {
        // Clone the Arc out so the shard is not held while waiting.
        let lock = Arc::clone(self.locks.entry(key.clone()).or_default().value());
        KeyGuard {
            locks: self,
            key: key.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }
}

pub struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: StockKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters clone the Arc under the shard lock, so a count of one here
        // means nobody else can reach this mutex.
        self.locks
            .locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
