//! # ماژول تنظیمات (Configuration)
//!
//! این ماژول مسئول خوندن و مدیریت تنظیمات برنامه هست.
//! علاوه بر تنظیمات سرور، سیاست‌های کتابخانه (مدت امانت) و
//! زمان‌بندی sweep‌های دوره‌ای هم اینجا تعریف میشن.
//!
//! ## مفاهیم Rust:
//! - **Structs**: ساختار داده‌ای برای نگهداری تنظیمات
//! - **Default Trait**: مقادیر پیش‌فرض
//! - **Builder Pattern**: ساخت تدریجی آبجکت

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// secret پیش‌فرض که در production مجاز نیست
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// تنظیمات اصلی برنامه
///
/// # مثال
/// ```rust
/// use library_service::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.loan_period_days, 7);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// آدرس هاست سرور
    pub host: String,

    /// پورت سرور
    pub port: u16,

    /// آدرس اتصال به دیتابیس
    pub database_url: String,

    /// کلید مخفی JWT
    pub jwt_secret: String,

    /// مدت اعتبار توکن JWT (ساعت)
    pub jwt_expiration_hours: u64,

    /// محیط اجرا (development, production)
    pub environment: Environment,

    /// مدت امانت (روز) - `due_date = borrow_date +` این مقدار
    pub loan_period_days: u32,

    /// مدت اعتبار کد تایید حساب (دقیقه)
    pub verification_code_ttl_minutes: u32,

    /// فاصله اجرای sweep یادآوری (ثانیه)
    pub overdue_sweep_interval_secs: u64,

    /// پنجره زمانی یادآوری (ساعت)
    pub reminder_window_hours: u32,

    /// سیاست انتخاب رکوردها برای یادآوری
    pub reminder_policy: ReminderPolicy,

    /// فاصله اجرای sweep حذف حساب‌های تایید نشده (ثانیه)
    pub unverified_sweep_interval_secs: u64,

    /// عمر حساب تایید نشده قبل از حذف (دقیقه)
    pub unverified_account_ttl_minutes: u32,
}

/// محیط اجرای برنامه
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// محیط توسعه - با قابلیت‌های دیباگ
    #[default]
    Development,

    /// محیط تست
    Testing,

    /// محیط تولید
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Development,
        }
    }
}

// =====================================
// Reminder Policy
// =====================================
/// کدوم رکوردها در sweep یادآوری انتخاب بشن
///
/// متن ایمیل میگه «کتاب تا ۲۴ ساعت دیگه سررسید میشه» ولی فیلتر
/// پیش‌فرض `due_date < now - 24h` هست، یعنی رکوردهایی که بیش از یک روز از
/// سررسیدشون گذشته. هر دو رفتار اینجا با اسم مشخص در دسترسه.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderPolicy {
    /// فیلتر تحت‌اللفظی: `due_date < now - window`
    #[default]
    OverdueGrace,

    /// یادآوری قبل از سررسید: `due_date < now + window`
    DueSoon,
}

impl ReminderPolicy {
    /// محاسبه cutoff برای query
    ///
    /// رکوردهایی با `due_date < cutoff` انتخاب میشن.
    #[must_use]
    pub fn cutoff(
        &self,
        now: chrono::DateTime<chrono::Utc>,
        window: chrono::Duration,
    ) -> chrono::DateTime<chrono::Utc> {
        match self {
            Self::OverdueGrace => now - window,
            Self::DueSoon => now + window,
        }
    }
}

impl From<String> for ReminderPolicy {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "due-soon" | "due_soon" | "duesoon" => ReminderPolicy::DueSoon,
            _ => ReminderPolicy::OverdueGrace,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_url: "sqlite://data/library.db?mode=rwc".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expiration_hours: 24,
            environment: Environment::Development,
            loan_period_days: 7,
            verification_code_ttl_minutes: 10,
            overdue_sweep_interval_secs: 30 * 60,
            reminder_window_hours: 24,
            reminder_policy: ReminderPolicy::OverdueGrace,
            unverified_sweep_interval_secs: 5 * 60,
            unverified_account_ttl_minutes: 30,
        }
    }
}

impl Config {
    /// ساخت تنظیمات از متغیرهای محیطی
    ///
    /// هر کلید مقدار پیش‌فرض داره، پس فقط چیزی که لازمه رو ست کنید.
    ///
    /// # Errors
    /// خطا برمیگردونه اگه تنظیمات نهایی معتبر نباشه
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let get_env = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let parse_env = |key: &str, default: u64| -> u64 {
            env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };

        let port = u16::try_from(parse_env("PORT", u64::from(defaults.port)))
            .map_err(|_| AppError::Config("PORT is out of range".to_string()))?;

        let config = Self {
            host: get_env("HOST", &defaults.host),
            port,
            database_url: get_env("DATABASE_URL", &defaults.database_url),
            jwt_secret: get_env("JWT_SECRET", &defaults.jwt_secret),
            jwt_expiration_hours: parse_env("JWT_EXPIRATION_HOURS", defaults.jwt_expiration_hours),
            environment: get_env("ENVIRONMENT", "development").into(),
            loan_period_days: parse_env("LOAN_PERIOD_DAYS", u64::from(defaults.loan_period_days))
                as u32,
            verification_code_ttl_minutes: parse_env(
                "VERIFICATION_CODE_TTL_MINUTES",
                u64::from(defaults.verification_code_ttl_minutes),
            ) as u32,
            overdue_sweep_interval_secs: parse_env(
                "OVERDUE_SWEEP_INTERVAL_SECS",
                defaults.overdue_sweep_interval_secs,
            ),
            reminder_window_hours: parse_env(
                "REMINDER_WINDOW_HOURS",
                u64::from(defaults.reminder_window_hours),
            ) as u32,
            reminder_policy: get_env("REMINDER_POLICY", "overdue-grace").into(),
            unverified_sweep_interval_secs: parse_env(
                "UNVERIFIED_SWEEP_INTERVAL_SECS",
                defaults.unverified_sweep_interval_secs,
            ),
            unverified_account_ttl_minutes: parse_env(
                "UNVERIFIED_ACCOUNT_TTL_MINUTES",
                u64::from(defaults.unverified_account_ttl_minutes),
            ) as u32,
        };

        config.validate()?;
        Ok(config)
    }

    /// اعتبارسنجی تنظیمات
    pub fn validate(&self) -> Result<()> {
        if self.environment.is_production() && self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(AppError::Config(
                "JWT_SECRET must be changed in production".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(AppError::Config("PORT cannot be 0".to_string()));
        }

        if self.loan_period_days == 0 {
            return Err(AppError::Config(
                "LOAN_PERIOD_DAYS must be at least 1".to_string(),
            ));
        }

        if self.overdue_sweep_interval_secs == 0 || self.unverified_sweep_interval_secs == 0 {
            return Err(AppError::Config(
                "Sweep intervals must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// آدرس کامل سرور
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn loan_period(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.loan_period_days))
    }

    #[must_use]
    pub fn verification_code_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.verification_code_ttl_minutes))
    }

    #[must_use]
    pub fn reminder_window(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.reminder_window_hours))
    }

    #[must_use]
    pub fn unverified_account_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.unverified_account_ttl_minutes))
    }

    #[must_use]
    pub fn overdue_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.overdue_sweep_interval_secs)
    }

    #[must_use]
    pub fn unverified_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.unverified_sweep_interval_secs)
    }
}

// =====================================
// Builder Pattern
// =====================================
/// ساخت Config با Builder Pattern
///
/// # مثال
/// ```rust
/// use library_service::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .port(8080)
///     .loan_period_days(14)
///     .build();
/// assert_eq!(config.loan_period_days, 14);
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    #[must_use]
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    #[must_use]
    pub fn environment(mut self, env: Environment) -> Self {
        self.config.environment = env;
        self
    }

    #[must_use]
    pub fn loan_period_days(mut self, days: u32) -> Self {
        self.config.loan_period_days = days;
        self
    }

    #[must_use]
    pub fn reminder_policy(mut self, policy: ReminderPolicy) -> Self {
        self.config.reminder_policy = policy;
        self
    }

    #[must_use]
    pub fn reminder_window_hours(mut self, hours: u32) -> Self {
        self.config.reminder_window_hours = hours;
        self
    }

    #[must_use]
    pub fn unverified_account_ttl_minutes(mut self, minutes: u32) -> Self {
        self.config.unverified_account_ttl_minutes = minutes;
        self
    }

    /// ساخت Config نهایی
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }

    /// ساخت Config با اعتبارسنجی
    ///
    /// # Errors
    /// خطا برمیگردونه اگه اعتبارسنجی fail بشه
    pub fn build_validated(self) -> Result<Config> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.loan_period_days, 7);
        assert_eq!(config.overdue_sweep_interval_secs, 1800);
        assert_eq!(config.unverified_sweep_interval_secs, 300);
        assert_eq!(config.reminder_policy, ReminderPolicy::OverdueGrace);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new().port(8080).host("0.0.0.0").build();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_environment_from_string() {
        assert_eq!(Environment::from("production".to_string()), Environment::Production);
        assert_eq!(Environment::from("PROD".to_string()), Environment::Production);
        assert_eq!(Environment::from("unknown".to_string()), Environment::Development);
    }

    #[test]
    fn test_reminder_policy_from_string() {
        assert_eq!(ReminderPolicy::from("due-soon".to_string()), ReminderPolicy::DueSoon);
        assert_eq!(ReminderPolicy::from("anything".to_string()), ReminderPolicy::OverdueGrace);
    }

    #[test]
    fn test_reminder_cutoff() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let window = chrono::Duration::hours(24);

        assert_eq!(
            ReminderPolicy::OverdueGrace.cutoff(now, window),
            Utc.with_ymd_and_hms(2024, 5, 9, 12, 0, 0).unwrap()
        );
        assert_eq!(
            ReminderPolicy::DueSoon.cutoff(now, window),
            Utc.with_ymd_and_hms(2024, 5, 11, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_validation_fails_in_production_with_default_secret() {
        let config = ConfigBuilder::new()
            .environment(Environment::Production)
            .build();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_loan_period() {
        assert!(ConfigBuilder::new().loan_period_days(0).build_validated().is_err());
    }
}
