//! # یادآوری امانت‌های دیرکرد

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use tracing::{info, instrument, warn};

use super::{Sweep, SweepReport};
use crate::{
    config::ReminderPolicy,
    database::BorrowRecordRepository,
    error::Result,
    services::{AppState, Clock, EmailMessage, Mailer},
    utils::mask_email,
};

/// ارسال ایمیل یادآوری برای رکوردهای باز و یادآوری نشده
///
/// رکورد فقط بعد از ارسال موفق `notified` میشه، پس ارسال ناموفق
/// در اجرای بعدی دوباره امتحان میشه.
#[derive(Debug, Clone)]
pub struct OverdueReminderSweep {
    records: BorrowRecordRepository,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    policy: ReminderPolicy,
    window: ChronoDuration,
    interval: Duration,
}

impl OverdueReminderSweep {
    #[must_use]
    pub fn new(
        records: BorrowRecordRepository,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        policy: ReminderPolicy,
        window: ChronoDuration,
        interval: Duration,
    ) -> Self {
        Self {
            records,
            mailer,
            clock,
            policy,
            window,
            interval,
        }
    }

    #[must_use]
    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            BorrowRecordRepository::new(state.db.clone()),
            state.mailer.clone(),
            state.clock.clone(),
            state.config.reminder_policy,
            state.config.reminder_window(),
            state.config.overdue_sweep_interval(),
        )
    }
}

#[async_trait]
impl Sweep for OverdueReminderSweep {
    fn name(&self) -> &'static str {
        "overdue-reminder"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    #[instrument(skip(self), fields(policy = ?self.policy))]
    async fn run_once(&self) -> Result<SweepReport> {
        let cutoff = self.policy.cutoff(self.clock.now(), self.window);
        let records = self.records.find_overdue_unnotified(cutoff).await?;

        let mut report = SweepReport::selected(records.len());

        for record in records {
            if record.user.email.trim().is_empty() {
                report.skipped += 1;
                continue;
            }

            let message = EmailMessage::reminder(&record.user.name, &record.user.email);
            if let Err(e) = self.mailer.send(message).await {
                warn!(
                    record_id = %record.id,
                    to = %mask_email(&record.user.email),
                    error = %e,
                    "Failed to send reminder"
                );
                report.failed += 1;
                continue;
            }

            match self.records.mark_notified(&record.id, self.clock.now()).await {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    warn!(record_id = %record.id, error = %e, "Failed to mark record as notified");
                    report.failed += 1;
                }
            }
        }

        if report.selected > 0 {
            info!(
                selected = report.selected,
                sent = report.succeeded,
                failed = report.failed,
                "Overdue reminders processed"
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::{BookRepository, Database, Repository, UserRepository},
        error::AppError,
        models::{BorrowRecord, CreateBookRequest, CreateUser, Role},
        services::{FixedClock, MockMailer},
    };
    use chrono::{TimeZone, Utc};

    async fn seed_overdue(db: &Database, count: usize) -> Vec<BorrowRecord> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let user = UserRepository::new(db.clone())
            .create(
                &CreateUser::new("Late", "late@example.com", "password123", Role::User)
                    .unwrap()
                    .verified(),
                start,
            )
            .await
            .unwrap();
        let book = BookRepository::new(db.clone())
            .create(
                &CreateBookRequest {
                    title: "Snow Crash".to_string(),
                    author: "Neal Stephenson".to_string(),
                    description: "Pizza".to_string(),
                    price: 60,
                    quantity: 5,
                }
                .into(),
                start,
            )
            .await
            .unwrap();

        let mut records = Vec::new();
        for _ in 0..count {
            let record = BorrowRecord::open(&user, &book, start, start + ChronoDuration::days(7));
            BorrowRecordRepository::create(db.pool(), &record).await.unwrap();
            records.push(record);
        }
        records
    }

    fn sweep(db: &Database, mailer: MockMailer, now: chrono::DateTime<Utc>) -> OverdueReminderSweep {
        OverdueReminderSweep::new(
            BorrowRecordRepository::new(db.clone()),
            Arc::new(mailer),
            Arc::new(FixedClock::new(now)),
            ReminderPolicy::OverdueGrace,
            ChronoDuration::hours(24),
            Duration::from_secs(1800),
        )
    }

    #[tokio::test]
    async fn test_sends_once_and_marks_notified() {
        let db = Database::in_memory().await.unwrap();
        let records = seed_overdue(&db, 2).await;
        let now = records[0].due_date + ChronoDuration::hours(25);

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|message| message.to_email == "late@example.com")
            .times(2)
            .returning(|_| Ok(()));

        let sweep = sweep(&db, mailer, now);
        let report = sweep.run_once().await.unwrap();
        assert_eq!(report.selected, 2);
        assert_eq!(report.succeeded, 2);

        // دفعه دوم چیزی انتخاب نمیشه
        let report = sweep.run_once().await.unwrap();
        assert_eq!(report, SweepReport::default());
    }

    #[tokio::test]
    async fn test_failed_send_is_retried_later() {
        let db = Database::in_memory().await.unwrap();
        let records = seed_overdue(&db, 1).await;
        let now = records[0].due_date + ChronoDuration::hours(30);

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_| Err(AppError::Internal("smtp down".to_string())));

        let report = sweep(&db, mailer, now).run_once().await.unwrap();
        assert_eq!(report.failed, 1);

        let stored = BorrowRecordRepository::new(db.clone())
            .find_by_id(&records[0].id)
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.notified);
    }

    #[tokio::test]
    async fn test_recently_overdue_is_not_selected() {
        let db = Database::in_memory().await.unwrap();
        let records = seed_overdue(&db, 1).await;
        let now = records[0].due_date + ChronoDuration::hours(23);

        let mut mailer = MockMailer::new();
        mailer.expect_send().never();

        let report = sweep(&db, mailer, now).run_once().await.unwrap();
        assert_eq!(report.selected, 0);
    }
}
