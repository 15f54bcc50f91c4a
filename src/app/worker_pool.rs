//! Bounded worker pool for independent per-file work
//!
//! At most `jobs` futures run at once. Results come back in submission
//! order regardless of completion order. A fatal error from any worker, or
//! cancellation, aborts the remaining workers and waits for them to be
//! dropped so their child processes are gone before the caller continues.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::DomainError;

/// Run `work` over `items` with bounded concurrency.
///
/// `on_done(completed, total)` is called after every finished item.
pub async fn run_bounded<I, T, F, Fut>(
    items: Vec<I>,
    jobs: usize,
    cancel: &CancellationToken,
    mut on_done: impl FnMut(usize, usize),
    work: F,
) -> Result<Vec<T>, DomainError>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, DomainError>> + Send + 'static,
{
    let total = items.len();
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let mut workers = JoinSet::new();

    for (slot, item) in items.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let task = work(item);
        workers.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| DomainError::InternalError("worker pool closed".to_string()))?;
            task.await.map(|value| (slot, value))
        });
    }

    let mut results: Vec<Option<T>> = (0..total).map(|_| None).collect();
    let mut completed = 0;
    loop {
        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                workers.shutdown().await;
                return Err(DomainError::Cancelled);
            }
            joined = workers.join_next() => joined,
        };
        let Some(joined) = joined else {
            break;
        };

        match joined {
            Ok(Ok((slot, value))) => {
                results[slot] = Some(value);
                completed += 1;
                on_done(completed, total);
            }
            Ok(Err(e)) => {
                workers.shutdown().await;
                return Err(e);
            }
            Err(join_error) => {
                workers.shutdown().await;
                return Err(DomainError::InternalError(format!(
                    "worker task failed: {}",
                    join_error
                )));
            }
        }
    }

    Ok(results.into_iter().flatten().collect())
}
