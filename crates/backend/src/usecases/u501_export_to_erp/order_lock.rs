use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Заказы, по которым сейчас идёт выгрузка (в пределах процесса)
#[derive(Clone, Default)]
pub struct OrderLocks {
    active: Arc<Mutex<HashSet<i64>>>,
}

/// Снимает блокировку заказа при drop
pub struct OrderLockGuard {
    active: Arc<Mutex<HashSet<i64>>>,
    order_id: i64,
}

fn lock(active: &Mutex<HashSet<i64>>) -> MutexGuard<'_, HashSet<i64>> {
    active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// None, если заказ уже выгружается другим запуском
    pub fn try_acquire(&self, order_id: i64) -> Option<OrderLockGuard> {
        if !lock(&self.active).insert(order_id) {
            return None;
        }
        Some(OrderLockGuard {
            active: Arc::clone(&self.active),
            order_id,
        })
    }

    pub fn is_locked(&self, order_id: i64) -> bool {
        lock(&self.active).contains(&order_id)
    }
}

impl Drop for OrderLockGuard {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.order_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_released_on_drop() {
        let locks = OrderLocks::new();
        let guard = locks.try_acquire(1).unwrap();
        assert!(locks.try_acquire(1).is_none());
        assert!(locks.try_acquire(2).is_some());
        drop(guard);
        assert!(!locks.is_locked(1));
        assert!(locks.try_acquire(1).is_some());
    }
}
