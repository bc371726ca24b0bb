//! Database module
//!
//! Connection pool, schema checks and the records the service needs before
//! it can accept traffic.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{AuthError, SecretHasher};
use crate::config::Config;
use crate::domain::AccountNumber;
use crate::store::{system_opening_balance, BankStore, StoreError};

/// Tables created by `migrations/`
const REQUIRED_TABLES: &[&str] = &[
    "customers",
    "transactions",
    "site_settings",
    "admin_users",
    "admin_sessions",
];

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Could not hash bootstrap admin password: {0}")]
    Auth(#[from] AuthError),
}

/// Open the connection pool
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    verify_connection(&pool).await?;
    Ok(pool)
}

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}

/// Create the system bank account if it is missing. Its hashes are not PHC
/// strings, so nobody can log in as it.
pub async fn ensure_system_account(pool: &PgPool) -> Result<(), sqlx::Error> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO customers (
            id, account_number, name, email, address, city, country,
            balance, password_hash, pin_hash, is_system
        )
        VALUES ($1, $2, 'System Bank Account', 'system@bank.internal', '-', '-', '-',
                $3, '!', '!', TRUE)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(AccountNumber::system().as_str())
    .bind(system_opening_balance())
    .execute(pool)
    .await?
    .rows_affected();

    if inserted > 0 {
        tracing::info!(
            account_number = %AccountNumber::system(),
            "Created system bank account"
        );
    } else {
        tracing::info!("System bank account verified");
    }

    Ok(())
}

/// Create the configured bootstrap admin when no admin with that username
/// exists yet. Existing admins are never modified.
pub async fn ensure_bootstrap_admin(
    store: &dyn BankStore,
    hasher: &SecretHasher,
    config: &Config,
) -> Result<(), BootstrapError> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        tracing::debug!("No bootstrap admin configured");
        return Ok(());
    };

    if store.find_admin_by_username(username).await?.is_some() {
        return Ok(());
    }

    let admin = store.insert_admin(username, &hasher.hash(password)?).await?;
    tracing::info!(admin_id = %admin.id, username = %admin.username, "Created bootstrap admin");
    Ok(())
}
