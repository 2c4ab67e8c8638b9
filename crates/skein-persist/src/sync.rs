//! Write serialization for the thread store.
//!
//! Mutations of one thread run one at a time, in arrival order; different
//! threads never wait on each other. Listing waits for every in-flight
//! mutation through a store-wide drain barrier.
//!
//! Lock order is always barrier, then thread mutex.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, OwnedRwLockReadGuard, RwLock, RwLockWriteGuard};
use tracing::trace;

/// Per-key async mutex.
///
/// Entries are dropped again as soon as nobody holds or waits for them, so
/// the map only ever contains keys with work in flight.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the lock for `key`.
    pub fn get(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Forget `key` if the map holds the only reference to its lock.
    pub fn release(&self, key: &str) {
        self.locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held for the duration of one thread operation.
pub struct ThreadGuard {
    key: String,
    locks: KeyedLocks,
    guard: Option<OwnedMutexGuard<()>>,
    _drain: Option<OwnedRwLockReadGuard<()>>,
}

impl Drop for ThreadGuard {
    fn drop(&mut self) {
        // The mutex guard holds a reference to the lock, so it goes first.
        self.guard.take();
        self.locks.release(&self.key);
        trace!(thread_id = %self.key, "Released thread lock");
    }
}

/// Thread locks plus the drain barrier.
#[derive(Clone, Default)]
pub struct ThreadLocks {
    threads: KeyedLocks,
    drain: Arc<RwLock<()>>,
}

impl ThreadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive access to one thread for a mutation.
    ///
    /// The drain read guard is held until the returned guard drops. The
    /// barrier is fair, so once a [`drain`](Self::drain) is queued behind
    /// this guard, new writes to every other thread wait too.
    pub async fn write(&self, thread_id: &str) -> ThreadGuard {
        let drain = Arc::clone(&self.drain).read_owned().await;
        self.acquire(thread_id, Some(drain)).await
    }

    /// Waits for queued mutations of one thread, without holding up listings.
    pub async fn read(&self, thread_id: &str) -> ThreadGuard {
        self.acquire(thread_id, None).await
    }

    /// Resolves once every mutation that started before it has finished.
    /// Mutations arriving later wait until the returned guard is dropped.
    pub async fn drain(&self) -> RwLockWriteGuard<'_, ()> {
        self.drain.write().await
    }

    async fn acquire(
        &self,
        thread_id: &str,
        drain: Option<OwnedRwLockReadGuard<()>>,
    ) -> ThreadGuard {
        let guard = self.threads.get(thread_id).lock_owned().await;
        trace!(thread_id, "Acquired thread lock");
        ThreadGuard {
            key: thread_id.to_string(),
            locks: self.threads.clone(),
            guard: Some(guard),
            _drain: drain,
        }
    }

    /// Number of threads with a held or awaited lock.
    pub fn active_threads(&self) -> usize {
        self.threads.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn get_returns_same_lock_for_same_key() {
        let locks = KeyedLocks::new();
        assert!(Arc::ptr_eq(&locks.get("a"), &locks.get("a")));
        assert!(!Arc::ptr_eq(&locks.get("a"), &locks.get("b")));
    }

    #[test]
    fn release_keeps_referenced_locks() {
        let locks = KeyedLocks::new();
        let held = locks.get("a");

        locks.release("a");
        assert_eq!(locks.len(), 1);

        drop(held);
        locks.release("a");
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn same_thread_is_serialized() {
        let locks = ThreadLocks::new();
        let _first = locks.write("t1").await;

        let second = tokio::time::timeout(Duration::from_millis(20), locks.write("t1")).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn different_threads_run_concurrently() {
        let locks = ThreadLocks::new();
        let _first = locks.write("t1").await;

        let second = tokio::time::timeout(Duration::from_millis(20), locks.write("t2")).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn drain_waits_for_writers() {
        let locks = ThreadLocks::new();
        let writer = locks.write("t1").await;

        let blocked = tokio::time::timeout(Duration::from_millis(20), locks.drain()).await;
        assert!(blocked.is_err());

        drop(writer);
        let drained = tokio::time::timeout(Duration::from_millis(20), locks.drain()).await;
        assert!(drained.is_ok());
    }

    #[tokio::test]
    async fn queued_drain_holds_back_writes_to_other_threads() {
        let locks = ThreadLocks::new();
        let writer = locks.write("t1").await;

        let draining = locks.clone();
        let drain = tokio::spawn(async move {
            let _drained = draining.drain().await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let other = tokio::time::timeout(Duration::from_millis(20), locks.write("t2")).await;
        assert!(other.is_err());

        drop(writer);
        drain.await.unwrap();
        let other = tokio::time::timeout(Duration::from_millis(20), locks.write("t2")).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn read_does_not_block_drain() {
        let locks = ThreadLocks::new();
        let _reader = locks.read("t1").await;

        let drained = tokio::time::timeout(Duration::from_millis(20), locks.drain()).await;
        assert!(drained.is_ok());
    }

    #[tokio::test]
    async fn entries_are_pruned_after_release() {
        let locks = ThreadLocks::new();
        {
            let _guard = locks.write("t1").await;
            assert_eq!(locks.active_threads(), 1);
        }
        assert_eq!(locks.active_threads(), 0);
    }
}
