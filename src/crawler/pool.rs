//! Bounded worker pool over a JoinSet

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs `f` over every item with at most `workers` futures in flight
///
/// Results come back in completion order. A task that panics is logged and
/// contributes nothing; its siblings are unaffected.
pub async fn run_bounded<I, T, F, Fut>(items: I, workers: usize, f: F) -> Vec<T>
where
    I: IntoIterator,
    I::Item: Send + 'static,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut set = JoinSet::new();

    for item in items {
        let semaphore = Arc::clone(&semaphore);
        let task = f(item);
        set.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            task.await
        });
    }

    let mut results = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(value) => results.push(value),
            Err(e) => tracing::error!("Worker task failed: {}", e),
        }
    }
    results
}
