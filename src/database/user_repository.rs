//! # User Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

use super::{Database, Repository};
use crate::{
    error::{AppError, Result},
    models::{CreateUser, User},
};

/// Repository برای مدیریت کاربران
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// pool زیرین، برای توابعی که executor میگیرن
    #[must_use]
    pub fn pool(&self) -> &sqlx::SqlitePool {
        self.db.pool()
    }

    /// پیدا کردن با email (تایید شده یا نشده)
    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, account_verified,
                   verification_code, verification_code_expires_at, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// پیدا کردن کاربر تایید شده با email
    ///
    /// امانت و بازگشت فقط برای حساب‌های تایید شده مجازه.
    pub async fn find_verified_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, account_verified,
                   verification_code, verification_code_expires_at, created_at, updated_at
            FROM users
            WHERE email = ? AND account_verified = 1
            "#,
        )
        .bind(email)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// پیدا کردن با کد تایید
    pub async fn find_by_verification_code(&self, code: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, account_verified,
                   verification_code, verification_code_expires_at, created_at, updated_at
            FROM users
            WHERE verification_code = ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(code)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(user)
    }

    /// همه کاربران تایید شده
    pub async fn find_verified(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, account_verified,
                   verification_code, verification_code_expires_at, created_at, updated_at
            FROM users
            WHERE account_verified = 1
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(users)
    }

    /// ایجاد کاربر جدید
    pub async fn create(&self, create_user: &CreateUser, now: DateTime<Utc>) -> Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, account_verified,
                               verification_code, verification_code_expires_at,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&create_user.id)
        .bind(&create_user.name)
        .bind(&create_user.email)
        .bind(&create_user.password_hash)
        .bind(create_user.role)
        .bind(create_user.account_verified)
        .bind(&create_user.verification_code)
        .bind(create_user.verification_code_expires_at)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::from_db_conflict(e, "User already exists with this email"))?;

        self.find_by_id(&create_user.id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create user".to_string()))
    }

    /// کد تایید جدید برای حساب تایید نشده
    pub async fn refresh_verification_code(
        &self,
        id: &str,
        code: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET verification_code = ?, verification_code_expires_at = ?, updated_at = ?
            WHERE id = ? AND account_verified = 0
            "#,
        )
        .bind(code)
        .bind(expires_at)
        .bind(now)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// جایگزینی hash رمز عبور
    pub async fn update_password_hash(
        &self,
        id: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(now)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// تایید حساب و پاک کردن کد
    pub async fn mark_verified(&self, id: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        sqlx::query(
            r#"
            UPDATE users
            SET account_verified = 1,
                verification_code = NULL,
                verification_code_expires_at = NULL,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        self.find_by_id(id).await
    }

    /// حذف کاربر
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// حذف حساب‌های تایید نشده قدیمی‌تر از `cutoff`
    pub async fn delete_unverified_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM users WHERE account_verified = 0 AND created_at < ?",
        )
        .bind(cutoff)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository for UserRepository {
    type Entity = User;
    type Id = str;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, account_verified,
                   verification_code, verification_code_expires_at, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(user)
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, account_verified,
                   verification_code, verification_code_expires_at, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(users)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[tokio::test]
    async fn test_unverified_cleanup_keeps_verified_and_recent_users() {
        let db = Database::in_memory().await.unwrap();
        let repo = UserRepository::new(db);
        let now = Utc::now();
        let old = now - chrono::Duration::minutes(45);

        let stale = CreateUser::new("Stale", "stale@example.com", "password123", Role::User).unwrap();
        repo.create(&stale, old).await.unwrap();

        let fresh = CreateUser::new("Fresh", "fresh@example.com", "password123", Role::User).unwrap();
        repo.create(&fresh, now).await.unwrap();

        let verified = CreateUser::new("Old", "old@example.com", "password123", Role::User)
            .unwrap()
            .verified();
        repo.create(&verified, old).await.unwrap();

        let deleted = repo
            .delete_unverified_older_than(now - chrono::Duration::minutes(30))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert!(UserRepository::find_by_email(repo.pool(), "stale@example.com")
            .await
            .unwrap()
            .is_none());
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_verified_by_email_ignores_unverified() {
        let db = Database::in_memory().await.unwrap();
        let repo = UserRepository::new(db.clone());
        let user = CreateUser::new("Nima", "nima@example.com", "password123", Role::User).unwrap();
        let created = repo.create(&user, Utc::now()).await.unwrap();

        assert!(UserRepository::find_verified_by_email(db.pool(), "nima@example.com")
            .await
            .unwrap()
            .is_none());

        let verified = repo.mark_verified(&created.id, Utc::now()).await.unwrap().unwrap();
        assert!(verified.account_verified);
        assert_eq!(verified.role, Role::User);

        assert!(UserRepository::find_verified_by_email(db.pool(), "nima@example.com")
            .await
            .unwrap()
            .is_some());
    }
}
