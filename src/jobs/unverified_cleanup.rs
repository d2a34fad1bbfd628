//! # حذف حساب‌های تایید نشده

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use tracing::info;

use super::{Sweep, SweepReport};
use crate::{
    database::UserRepository,
    error::Result,
    services::{AppState, Clock},
};

/// حذف حساب‌هایی که بیشتر از `ttl` تایید نشده موندن
#[derive(Debug, Clone)]
pub struct UnverifiedCleanupSweep {
    users: UserRepository,
    clock: Arc<dyn Clock>,
    ttl: ChronoDuration,
    interval: Duration,
}

impl UnverifiedCleanupSweep {
    #[must_use]
    pub fn new(
        users: UserRepository,
        clock: Arc<dyn Clock>,
        ttl: ChronoDuration,
        interval: Duration,
    ) -> Self {
        Self {
            users,
            clock,
            ttl,
            interval,
        }
    }

    #[must_use]
    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            UserRepository::new(state.db.clone()),
            state.clock.clone(),
            state.config.unverified_account_ttl(),
            state.config.unverified_sweep_interval(),
        )
    }
}

#[async_trait]
impl Sweep for UnverifiedCleanupSweep {
    fn name(&self) -> &'static str {
        "unverified-cleanup"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run_once(&self) -> Result<SweepReport> {
        let cutoff = self.clock.now() - self.ttl;
        let deleted = self.users.delete_unverified_older_than(cutoff).await?;

        if deleted > 0 {
            info!(deleted, "Removed unverified accounts");
        }

        let deleted = usize::try_from(deleted).unwrap_or(usize::MAX);
        Ok(SweepReport {
            selected: deleted,
            succeeded: deleted,
            ..SweepReport::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::{Database, Repository},
        models::{CreateUser, Role},
        services::FixedClock,
    };
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_only_stale_unverified_accounts_are_removed() {
        let db = Database::in_memory().await.unwrap();
        let users = UserRepository::new(db.clone());
        let start = Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap();

        users
            .create(
                &CreateUser::new("Pending", "pending@example.com", "password123", Role::User).unwrap(),
                start,
            )
            .await
            .unwrap();
        users
            .create(
                &CreateUser::new("Done", "done@example.com", "password123", Role::User)
                    .unwrap()
                    .verified(),
                start,
            )
            .await
            .unwrap();

        let clock = Arc::new(FixedClock::new(start + ChronoDuration::minutes(20)));
        let sweep = UnverifiedCleanupSweep::new(
            users.clone(),
            clock.clone(),
            ChronoDuration::minutes(30),
            Duration::from_secs(300),
        );

        assert_eq!(sweep.run_once().await.unwrap().selected, 0);

        clock.advance(ChronoDuration::minutes(11));
        let report = sweep.run_once().await.unwrap();
        assert_eq!(report.succeeded, 1);
        assert_eq!(users.count().await.unwrap(), 1);
    }
}
