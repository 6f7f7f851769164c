use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-user lock so cart mutations for one user reach the backend in the
/// order they were issued. Different users never wait on each other.
#[derive(Debug, Default)]
pub struct CartMutationQueue {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl CartMutationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for this user's turn. The turn ends when the guard is dropped.
    pub async fn acquire(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_user_waits() {
        let queue = Arc::new(CartMutationQueue::new());
        let first = queue.acquire(1).await;

        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move {
                let _turn = queue.acquire(1).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("second mutation should proceed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_users_do_not_block() {
        let queue = CartMutationQueue::new();
        let _one = queue.acquire(1).await;
        let two = tokio::time::timeout(Duration::from_millis(100), queue.acquire(2)).await;
        assert!(two.is_ok());
    }
}
