//! Scheduled Jobs
//!
//! Background maintenance that runs on a fixed schedule next to the server.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::interval;

use crate::store::{BankStore, StoreError};

// =========================================================================
// Expired admin session purge
// =========================================================================

/// Delete admin sessions whose expiry is at or before `now`
pub async fn purge_expired_sessions(
    store: &dyn BankStore,
    now: DateTime<Utc>,
) -> Result<u64, JobError> {
    let rows_deleted = store.purge_expired_sessions(now).await?;

    if rows_deleted > 0 {
        tracing::info!(rows_deleted = rows_deleted, "Purged expired admin sessions");
    }

    Ok(rows_deleted)
}

// =========================================================================
// Job Scheduler
// =========================================================================

/// Configuration for job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Interval for the expired session purge (default: 5 minutes)
    pub session_cleanup_interval: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            session_cleanup_interval: Duration::from_secs(300),
        }
    }
}

/// Job Scheduler - runs periodic maintenance tasks
pub struct JobScheduler {
    store: Arc<dyn BankStore>,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    pub fn new(store: Arc<dyn BankStore>) -> Self {
        Self {
            store,
            config: JobSchedulerConfig::default(),
        }
    }

    pub fn with_config(store: Arc<dyn BankStore>, config: JobSchedulerConfig) -> Self {
        Self { store, config }
    }

    /// Start the job scheduler in the background
    /// Returns a handle that can be used to abort the scheduler
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        tracing::info!(
            interval_secs = self.config.session_cleanup_interval.as_secs(),
            "Job scheduler started"
        );

        let mut session_interval = interval(self.config.session_cleanup_interval);

        loop {
            session_interval.tick().await;
            if let Err(e) = purge_expired_sessions(self.store.as_ref(), Utc::now()).await {
                tracing::error!(error = %e, "Session purge failed");
            }
        }
    }

    /// Run all maintenance jobs once (for manual trigger or testing)
    pub async fn run_all_once(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match purge_expired_sessions(self.store.as_ref(), Utc::now()).await {
            Ok(count) => report.sessions_purged = count,
            Err(e) => report.errors.push(format!("Session purge: {}", e)),
        }

        report.completed_at = Utc::now();
        report
    }
}

/// Report from running maintenance jobs
#[derive(Debug, Clone, Default)]
pub struct MaintenanceReport {
    pub sessions_purged: u64,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

// =========================================================================
// Tests
// =========================================================================
