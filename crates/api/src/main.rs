use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use domain::services::NotificationService;
use tracing::info;

use lending_api::app;
use lending_api::config::Config;
use lending_api::jobs::{
    AcknowledgeReminderJob, JobScheduler, LendingGaugesJob, ReturnReminderJob,
};
use lending_api::middleware;
use lending_api::services::EmailService;

const JOB_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics()?;

    info!("Starting Lending Tracker API v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let notifier: Arc<dyn NotificationService> = Arc::new(EmailService::new(config.email.clone()));

    // Background jobs
    let mut scheduler = JobScheduler::new();
    scheduler.register(LendingGaugesJob::new(pool.clone()));
    if config.reminders.enabled {
        scheduler.register(AcknowledgeReminderJob::new(
            pool.clone(),
            notifier.clone(),
            config.reminders.acknowledge_after_hours,
            config.reminders.interval_minutes,
        ));
        scheduler.register(ReturnReminderJob::new(
            pool.clone(),
            notifier.clone(),
            config.reminders.interval_minutes,
        ));
    }
    scheduler.start();

    // Build application
    let addr = config.socket_addr();
    let app = app::create_app(config, pool, notifier)?;

    // Start server
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(JOB_SHUTDOWN_TIMEOUT).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
