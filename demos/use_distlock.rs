//! Ten tasks race to push a shared counter to 10 000.
//!
//! Without the lock the read-modify-write steps interleave and the counter
//! overshoots or the op count drifts. With the lock every increment happens
//! under one holder at a time.
//!
//! Run with: `cargo run --example use_distlock --features redis`

use distlock::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const TARGET: u64 = 10_000;
const WORKERS: usize = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,distlock_core=info")),
        )
        .init();

    let config = RedisConfig::from_env().build();
    let redis = RedisLockStore::new(&config).await?;
    redis.health_check().await?;
    let store: SharedStore = Arc::new(redis);

    let (count, ops) = race(None).await?;
    println!("[without lock] count: {count} op: {ops}");

    let (count, ops) = race(Some(store)).await?;
    println!("[with lock] count: {count} op: {ops}");

    Ok(())
}

async fn race(store: Option<SharedStore>) -> Result<(u64, u64), LockError> {
    let count = Arc::new(AtomicU64::new(0));
    let ops = Arc::new(AtomicU64::new(0));
    let manager = LockManager::new(LockConfig::default().timeout(Duration::from_secs(10)));

    let mut workers = Vec::with_capacity(WORKERS);
    for _ in 0..WORKERS {
        let count = count.clone();
        let ops = ops.clone();
        let manager = manager.clone();
        let store = store.clone();

        workers.push(tokio::spawn(async move {
            loop {
                let lock = match &store {
                    Some(store) => Some(manager.acquire("inc_count", store).await?),
                    None => None,
                };

                // Deliberately non-atomic read-modify-write.
                let current = count.load(Ordering::SeqCst);
                if current >= TARGET {
                    release(lock).await?;
                    break;
                }
                tokio::task::yield_now().await;
                count.store(current + 1, Ordering::SeqCst);
                ops.fetch_add(1, Ordering::SeqCst);

                release(lock).await?;
            }
            Ok::<(), LockError>(())
        }));
    }

    for worker in workers {
        worker.await.expect("worker panicked")?;
    }

    Ok((count.load(Ordering::SeqCst), ops.load(Ordering::SeqCst)))
}
