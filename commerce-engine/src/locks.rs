//! Per-id mutexes for resources written by more than one kind.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Stripe = Mutex<HashMap<String, Arc<Mutex<()>>>>;

/// A lock-striped map from resource id to mutex.
///
/// Entries live as long as the map. Waiters on one id are served in FIFO
/// order.
#[derive(Debug)]
pub struct LockMap {
    stripes: Vec<Stripe>,
}

impl LockMap {
    #[must_use]
    pub fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    /// Waits for and takes the mutex of `id`.
    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut stripe = self.stripe(id).lock().await;
            Arc::clone(stripe.entry(id.to_string()).or_default())
        };
        mutex.lock_owned().await
    }

    /// Number of ids that have been locked so far.
    pub async fn len(&self) -> usize {
        let mut total = 0;
        for stripe in &self.stripes {
            total += stripe.lock().await.len();
        }
        total
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn stripe(&self, id: &str) -> &Stripe {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        let index = (hasher.finish() % self.stripes.len() as u64) as usize;
        &self.stripes[index]
    }
}

impl Default for LockMap {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_id_is_serialized() {
        let locks = Arc::new(LockMap::new(4));
        let guard = locks.lock("state-1").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("state-1").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn distinct_ids_do_not_block() {
        let locks = LockMap::new(1);
        let _a = locks.lock("a").await;
        let _b = locks.lock("b").await;
        assert_eq!(locks.len().await, 2);
    }

    #[test]
    fn zero_stripes_still_works() {
        let locks = LockMap::new(0);
        assert_eq!(locks.stripes.len(), 1);
    }
}
