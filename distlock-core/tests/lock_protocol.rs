//! Integration tests for the acquire/release protocol against the in-memory store.

use async_trait::async_trait;
use distlock_core::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Wraps a store and counts every operation that reaches it.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    set_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl CountingStore {
    fn operations(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst) + self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LockStore for CountingStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> StoreResult<bool> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.compare_and_delete(key, expected).await
    }

    fn store_type(&self) -> &'static str {
        "counting"
    }
}

fn shared_memory() -> (Arc<MemoryStore>, SharedStore) {
    let store = Arc::new(MemoryStore::new());
    let shared: SharedStore = store.clone();
    (store, shared)
}

// =============================================================================
// Mutual exclusion
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_mutual_exclusion_under_contention() {
    let (_store, shared) = shared_memory();
    let manager = LockManager::new(
        LockConfig::default()
            .timeout(Duration::from_secs(60))
            .sleep_per_try(Duration::from_millis(5)),
    );

    let in_critical = Arc::new(AtomicBool::new(false));
    let count = Arc::new(AtomicUsize::new(0));

    let mut workers = Vec::new();
    for _ in 0..10 {
        let manager = manager.clone();
        let shared = shared.clone();
        let in_critical = in_critical.clone();
        let count = count.clone();

        workers.push(tokio::spawn(async move {
            for _ in 0..20 {
                let lock = manager.acquire("inc_count", &shared).await.unwrap();

                assert!(!in_critical.swap(true, Ordering::SeqCst), "two holders at once");
                let seen = count.load(Ordering::SeqCst);
                tokio::task::yield_now().await;
                sleep(Duration::from_millis(1)).await;
                count.store(seen + 1, Ordering::SeqCst);
                in_critical.store(false, Ordering::SeqCst);

                assert_eq!(lock.release().await.unwrap(), ReleaseOutcome::Released);
            }
        }));
    }

    for worker in workers {
        worker.await.unwrap();
    }

    assert_eq!(count.load(Ordering::SeqCst), 200);
}

#[tokio::test(start_paused = true)]
async fn test_different_resources_do_not_contend() {
    let (_store, shared) = shared_memory();
    let manager = LockManager::default();

    let a = manager.acquire("a", &shared).await.unwrap();
    let started = Instant::now();
    let b = manager.acquire("b", &shared).await.unwrap();
    assert_eq!(started.elapsed(), Duration::ZERO);

    a.release().await.unwrap();
    b.release().await.unwrap();
}

// =============================================================================
// Liveness under crash
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_unreleased_lock_expires() {
    let (_store, shared) = shared_memory();
    let manager = LockManager::new(LockConfig::default().expire(Duration::from_millis(300)));

    let crashed = manager.acquire("res", &shared).await.unwrap();
    crashed.leak();

    let started = Instant::now();
    let lock = manager
        .acquire_with("res", &shared, [with_timeout(Duration::from_secs(1))])
        .await
        .unwrap();

    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(300));
    assert!(waited <= Duration::from_millis(350));

    lock.release().await.unwrap();
}

// =============================================================================
// Safe release
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_stale_release_keeps_new_holder() {
    let (store, shared) = shared_memory();
    let manager = LockManager::new(LockConfig::default().expire(Duration::from_millis(100)));

    let stale = manager.acquire("res", &shared).await.unwrap();
    sleep(Duration::from_millis(150)).await;

    let fresh = manager.acquire("res", &shared).await.unwrap();
    assert_ne!(stale.token(), fresh.token());

    assert_eq!(stale.release().await.unwrap(), ReleaseOutcome::OwnershipMismatch);
    assert_eq!(store.value("distlock:res").as_deref(), Some(fresh.token().as_str()));

    assert_eq!(fresh.release().await.unwrap(), ReleaseOutcome::Released);
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_double_release_is_mismatch() {
    let (_store, shared) = shared_memory();
    let manager = LockManager::default();

    let lock = manager.acquire("res", &shared).await.unwrap();
    let copy = Lock::from_parts(
        lock.resource(),
        lock.key(),
        lock.token().clone(),
        Some(shared.clone()),
    );

    assert_eq!(lock.release().await.unwrap(), ReleaseOutcome::Released);
    assert_eq!(copy.release().await.unwrap(), ReleaseOutcome::OwnershipMismatch);
}

// =============================================================================
// Nil release
// =============================================================================

#[tokio::test]
async fn test_release_none_touches_no_store() {
    let store = Arc::new(CountingStore::default());

    let outcome = release(None).await.unwrap();

    assert_eq!(outcome, ReleaseOutcome::NotHeld);
    assert!(!outcome.is_released());
    assert_eq!(store.operations(), 0);
}

#[tokio::test]
async fn test_release_some_goes_through_store() {
    let store = Arc::new(CountingStore::default());
    let shared: SharedStore = store.clone();

    let lock = LockManager::default().try_acquire("res", &shared).await.unwrap();
    assert!(lock.is_some());

    assert_eq!(release(lock).await.unwrap(), ReleaseOutcome::Released);
    assert_eq!(store.set_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.delete_calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Scenario: job-42
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_job_42_waiter_gets_lock_after_lease() {
    let (_store, shared) = shared_memory();
    let manager = LockManager::new(
        LockConfig::default()
            .expire(Duration::from_millis(200))
            .timeout(Duration::from_secs(1))
            .sleep_per_try(Duration::from_millis(50)),
    );

    let started = Instant::now();
    let a = manager.acquire("job-42", &shared).await.unwrap();
    assert_eq!(started.elapsed(), Duration::ZERO);

    let b = manager.acquire("job-42", &shared).await.unwrap();
    let waited = started.elapsed();

    assert!(waited >= Duration::from_millis(200), "waited {:?}", waited);
    assert!(waited <= Duration::from_millis(250), "waited {:?}", waited);

    assert_eq!(a.release().await.unwrap(), ReleaseOutcome::OwnershipMismatch);
    assert_eq!(b.release().await.unwrap(), ReleaseOutcome::Released);
}

#[tokio::test(start_paused = true)]
async fn test_job_42_waiter_gets_lock_on_release() {
    let (_store, shared) = shared_memory();
    let manager = LockManager::new(
        LockConfig::default()
            .expire(Duration::from_millis(200))
            .timeout(Duration::from_secs(1))
            .sleep_per_try(Duration::from_millis(50)),
    );

    let a = manager.acquire("job-42", &shared).await.unwrap();

    let b = {
        let manager = manager.clone();
        let shared = shared.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let lock = manager.acquire("job-42", &shared).await.unwrap();
            (started.elapsed(), lock)
        })
    };

    sleep(Duration::from_millis(80)).await;
    assert_eq!(a.release().await.unwrap(), ReleaseOutcome::Released);

    let (waited, lock) = b.await.unwrap();
    assert_eq!(waited, Duration::from_millis(100));
    lock.release().await.unwrap();
}
