//! bankdesk - banking back-office API
//!
//! Serves the admin portal and the customer-facing endpoints over one
//! Postgres-backed account ledger.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bankdesk::api::{self, AppState};
use bankdesk::jobs::{JobScheduler, JobSchedulerConfig};
use bankdesk::store::{BankStore, PgStore};
use bankdesk::{db, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bankdesk=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_json);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(environment = %config.environment, "Starting bankdesk server");
    tracing::info!("Connecting to database...");

    let pool = db::connect(&config).await?;

    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }
    db::ensure_system_account(&pool).await?;

    let store: Arc<dyn BankStore> = Arc::new(PgStore::new(pool.clone()));
    let cleanup_interval = Duration::from_secs(config.session_cleanup_interval_secs);
    let state = AppState::new(store.clone(), config);

    db::ensure_bootstrap_admin(store.as_ref(), &state.hasher, &state.config).await?;

    tracing::info!("Database connected successfully");

    let scheduler = JobScheduler::with_config(
        store,
        JobSchedulerConfig {
            session_cleanup_interval: cleanup_interval,
        },
    )
    .start();

    let app = api::create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Cleanup
    tracing::info!("Server shutting down...");
    scheduler.abort();
    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
