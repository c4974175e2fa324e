use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

/// Caps how many probe futures are in flight at once.
///
/// Clones share the same permits. Callers build one queue per batch so the
/// cap applies to that batch only.
#[derive(Debug, Clone)]
pub struct ProbeQueue {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ProbeQueue {
    pub fn new(max_concurrency: usize) -> Self {
        let permits = max_concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            capacity: permits,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn run<F>(&self, fut: F) -> F::Output
    where
        F: Future,
    {
        // The semaphore is never closed, so acquire only fails if that changes.
        let _permit = self.semaphore.acquire().await.ok();
        fut.await
    }

    /// Drives every future under the cap and returns outputs in input order.
    pub async fn run_all<I, F>(&self, futs: I) -> Vec<F::Output>
    where
        I: IntoIterator<Item = F>,
        F: Future,
    {
        futures::future::join_all(futs.into_iter().map(|fut| self.run(fut))).await
    }
}
