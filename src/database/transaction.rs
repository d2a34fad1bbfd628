//! # تراکنش نوشتن (Write Transaction)
//!
//! تراکنش معمولی SQLite (`BEGIN`) قفل نوشتن رو تا اولین `UPDATE` نمیگیره.
//! اگه دو تراکنش اول بخونن و بعد بخوان بنویسن، دومی بلافاصله
//! `SQLITE_BUSY` میگیره و `busy_timeout` هم کمکی نمیکنه.
//!
//! `WriteTransaction` با `BEGIN IMMEDIATE` شروع میشه، پس قفل نوشتن از اول
//! گرفته میشه و درخواست‌های همزمان پشت `busy_timeout` صبر میکنن.

use sqlx::{pool::PoolConnection, Sqlite, SqliteConnection, SqlitePool};
use tracing::warn;

use crate::error::{AppError, Result};

/// تراکنشی که از اول قفل نوشتن داره
///
/// ```rust,ignore
/// let mut tx = db.begin_write().await?;
/// BookRepository::take_copy(tx.conn()?, &book_id, now).await?;
/// tx.commit().await?;
/// ```
///
/// اگه بدون `commit`/`rollback` drop بشه، `ROLLBACK` روی runtime فعلی
/// اجرا میشه و اتصال بعدش به pool برمیگرده.
#[derive(Debug)]
pub struct WriteTransaction {
    conn: Option<PoolConnection<Sqlite>>,
}

impl WriteTransaction {
    pub(crate) async fn begin(pool: &SqlitePool) -> Result<Self> {
        let mut conn = pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        Ok(Self { conn: Some(conn) })
    }

    /// اتصال تراکنش برای توابع repository
    pub fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal("Transaction already finished".to_string()))
    }

    pub async fn commit(mut self) -> Result<()> {
        sqlx::query("COMMIT").execute(self.conn()?).await?;
        self.conn = None;
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<()> {
        sqlx::query("ROLLBACK").execute(self.conn()?).await?;
        self.conn = None;
        Ok(())
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                        warn!(error = %e, "Failed to roll back dropped transaction");
                        // اتصال با تراکنش باز نباید به pool برگرده
                        drop(conn.detach());
                    }
                });
            }
            // بستن اتصال، تراکنش باز رو rollback میکنه
            Err(_) => drop(conn.detach()),
        }
    }
}
