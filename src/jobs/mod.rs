//! # کارهای دوره‌ای (Background Jobs)
//!
//! هر `Sweep` روی یک تسک tokio جدا با `interval` اجرا میشه:
//! - `OverdueReminderSweep`: ایمیل یادآوری برای امانت‌های دیرکرد
//! - `UnverifiedCleanupSweep`: حذف حساب‌های تایید نشده قدیمی
//!
//! خطای یک اجرا فقط لاگ میشه و اجرای بعدی طبق برنامه انجام میشه.
//! اجراهای یک sweep هیچوقت روی هم نمیفتن چون در یک loop پشت سر هم هستن.

mod overdue_reminder;
mod unverified_cleanup;

pub use overdue_reminder::*;
pub use unverified_cleanup::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::{error::Result, services::AppState};

// =====================================
// Sweep Trait
// =====================================
/// خلاصه یک اجرای sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// تعداد ردیف‌های انتخاب شده
    pub selected: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SweepReport {
    #[must_use]
    pub fn selected(selected: usize) -> Self {
        Self {
            selected,
            ..Self::default()
        }
    }
}

/// یک کار دوره‌ای
#[async_trait]
pub trait Sweep: Send + Sync {
    fn name(&self) -> &'static str;

    fn interval(&self) -> Duration;

    /// یک بار اجرا
    async fn run_once(&self) -> Result<SweepReport>;
}

// =====================================
// Scheduler
// =====================================
#[derive(Default)]
pub struct Scheduler {
    sweeps: Vec<Arc<dyn Sweep>>,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sweep(mut self, sweep: impl Sweep + 'static) -> Self {
        self.sweeps.push(Arc::new(sweep));
        self
    }

    /// شروع همه sweep‌ها
    ///
    /// اولین اجرا یک `interval` بعد از شروع انجام میشه.
    #[must_use]
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let tasks = self
            .sweeps
            .into_iter()
            .map(|sweep| {
                info!(
                    sweep = sweep.name(),
                    interval_secs = sweep.interval().as_secs(),
                    "Starting sweep"
                );
                tokio::spawn(run_loop(sweep, shutdown_rx.clone()))
            })
            .collect();

        SchedulerHandle {
            shutdown: shutdown_tx,
            tasks,
        }
    }
}

/// کنترل sweep‌های در حال اجرا
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// توقف sweep‌ها و صبر تا تموم شدن اجرای جاری
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);

        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Sweep task ended abnormally");
            }
        }

        info!("Scheduler stopped");
    }
}

async fn run_loop(sweep: Arc<dyn Sweep>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = time::interval(sweep.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // tick اول فوری برمیگرده
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match sweep.run_once().await {
                    Ok(report) => debug!(sweep = sweep.name(), ?report, "Sweep finished"),
                    Err(e) => error!(sweep = sweep.name(), error = %e, "Sweep failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

/// scheduler با sweep‌های پیش‌فرض برنامه
#[must_use]
pub fn build_scheduler(state: &AppState) -> Scheduler {
    Scheduler::new()
        .with_sweep(OverdueReminderSweep::from_state(state))
        .with_sweep(UnverifiedCleanupSweep::from_state(state))
}
