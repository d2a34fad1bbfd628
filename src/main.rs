//! # Library Service - نقطه ورود برنامه
//!
//! ترتیب راه‌اندازی: تنظیمات، لاگ، دیتابیس، sweep‌ها و در آخر سرور HTTP.
//! با Ctrl+C سرور درخواست‌های جاری رو تموم میکنه و sweep‌ها متوقف میشن.

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use library_service::{
    api::create_router,
    config::{Config, Environment},
    database::Database,
    error::{AppError, Result},
    jobs::build_scheduler,
    services::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // اگه فایل .env نباشه اوکیه
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.environment);

    info!("🚀 Starting Library Service...");
    info!(
        loan_period_days = config.loan_period_days,
        reminder_policy = ?config.reminder_policy,
        "✅ Configuration loaded"
    );

    let database = Database::connect(&config.database_url).await?;
    database.migrate().await?;
    info!("✅ Database connected and migrated");

    let state = AppState::new(database, config.clone());

    let scheduler = build_scheduler(&state).start();

    let app = create_router(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    let addr = listener.local_addr()?;
    info!("🌐 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Server(e.to_string()))?;

    scheduler.shutdown().await;
    info!("👋 Library Service stopped");

    Ok(())
}

/// راه‌اندازی سیستم tracing
///
/// در production خروجی JSON، در بقیه محیط‌ها فرمت pretty.
fn init_tracing(environment: Environment) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("library_service=debug,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if environment.is_production() {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_level(true)
                    .pretty(),
            )
            .init();
    }
}

/// صبر تا Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    info!("Shutdown signal received");
}
