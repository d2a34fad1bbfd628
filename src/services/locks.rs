//! # قفل به ازای هر کلید (Keyed Locks)
//!
//! امانت و بازگشت یک کتاب پشت سر هم اجرا میشن؛ کتاب‌های مختلف موازی.
//! تراکنش دیتابیس و UPDATE شرطی جلوی موجودی منفی رو میگیرن، این قفل
//! فقط ترتیب درخواست‌های همزمان روی یک کتاب رو قابل پیش‌بینی میکنه.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// قفل async برای هر کلید
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// گرفتن قفل `key`؛ با drop شدن guard آزاد میشه
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

            // قفل‌هایی که کسی نگهشون نداره پاک میشن
            locks.retain(|_, m| Arc::strong_count(m) > 1);

            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        mutex.lock_owned().await
    }

    /// تعداد کلیدهای در حال استفاده
    #[must_use]
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|m| Arc::strong_count(m) > 1)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let guard = locks.lock("book-1").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("book-1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock("book-1").await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock("book-2"))
            .await
            .expect("different keys must not contend");

        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn test_released_keys_are_pruned() {
        let locks = KeyedLocks::new();
        drop(locks.lock("book-1").await);
        let _b = locks.lock("book-2").await;

        assert_eq!(locks.active(), 1);
        assert_eq!(locks.locks.lock().unwrap().len(), 1);
    }
}
