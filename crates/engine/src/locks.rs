//! Per-shift write serialization.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Keyed async mutexes, one per shift.
///
/// Writers of the same shift queue on the same lock; different shifts never
/// contend.
#[derive(Debug, Default)]
pub(crate) struct ShiftLocks {
    inner: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl ShiftLocks {
    pub(crate) async fn acquire(&self, shift_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(map.entry(shift_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Drops the entry of a shift that will see no more writes.
    pub(crate) fn forget(&self, shift_id: Uuid) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.remove(&shift_id);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_shift_is_exclusive() {
        let locks = ShiftLocks::default();
        let id = Uuid::new_v4();
        let guard = locks.acquire(id).await;
        let second = tokio::time::timeout(Duration::from_millis(20), locks.acquire(id)).await;
        assert!(second.is_err());
        drop(guard);
        let _again = locks.acquire(id).await;
    }

    #[tokio::test]
    async fn different_shifts_do_not_contend() {
        let locks = ShiftLocks::default();
        let _a = locks.acquire(Uuid::new_v4()).await;
        let _b = locks.acquire(Uuid::new_v4()).await;
    }
}
