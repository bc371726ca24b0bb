//! Persistence port
//!
//! `BankStore` is the single abstraction over the account ledger, the
//! credential store, site settings and admin sessions. `PgStore` backs the
//! running service; `MemoryStore` backs tests and local demos.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub(crate) use memory::system_opening_balance;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    AccountNumber, AdminSession, AdminUser, Customer, CustomerChanges, CustomerFilter, Movement,
    NewCustomer, Page, SiteSettings, SiteSettingsChanges, TransactionRecord,
};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness constraint was violated
    #[error("Conflict on {0}")]
    Conflict(&'static str),

    #[error("Customer not found: {0}")]
    CustomerNotFound(Uuid),

    /// The guarded debit found less than the requested amount
    #[error("Insufficient funds in account {0}")]
    InsufficientFunds(Uuid),

    #[error("System record missing: {0}")]
    MissingSystemRecord(&'static str),
}

/// Aggregates for the admin dashboard. The system account is excluded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardTotals {
    pub total_customers: i64,
    pub total_balance: Decimal,
    pub total_transactions: i64,
    pub total_deposits: i64,
    pub total_deposit_amount: Decimal,
    pub transactions_today: i64,
}

#[async_trait]
pub trait BankStore: Send + Sync {
    // === Customers ===

    /// Insert a customer. Duplicate email or account number is `Conflict`.
    async fn insert_customer(&self, customer: NewCustomer) -> StoreResult<Customer>;

    async fn find_customer(&self, id: Uuid) -> StoreResult<Option<Customer>>;

    async fn find_customer_by_email(&self, email: &str) -> StoreResult<Option<Customer>>;

    async fn find_customer_by_account_number(
        &self,
        number: &AccountNumber,
    ) -> StoreResult<Option<Customer>>;

    /// Non-system customers, newest first, with the total match count
    async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page: Page,
    ) -> StoreResult<(Vec<Customer>, i64)>;

    /// Apply a partial update; `None` if the customer doesn't exist.
    async fn update_customer(
        &self,
        id: Uuid,
        changes: &CustomerChanges,
    ) -> StoreResult<Option<Customer>>;

    /// Hard delete; returns whether a row was removed.
    async fn delete_customer(&self, id: Uuid) -> StoreResult<bool>;

    /// The distinguished system bank account
    async fn system_account(&self) -> StoreResult<Customer>;

    // === Ledger ===

    /// Debit `from`, credit `to` and record the transaction as one atomic
    /// unit. With `enforce_funds` the debit only happens if the source
    /// balance covers the amount; otherwise nothing changes.
    async fn apply_movement(&self, movement: &Movement) -> StoreResult<TransactionRecord>;

    /// A customer's transactions, newest first
    async fn customer_transactions(
        &self,
        customer_id: Uuid,
        page: Page,
    ) -> StoreResult<(Vec<TransactionRecord>, i64)>;

    /// Every transaction involving the customer created at or after `since`,
    /// oldest first
    async fn customer_transactions_since(
        &self,
        customer_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<TransactionRecord>>;

    /// Sum of the customer's outgoing amounts since `since`
    async fn outgoing_total_since(
        &self,
        customer_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<Decimal>;

    /// All transactions, newest first
    async fn list_transactions(&self, page: Page) -> StoreResult<(Vec<TransactionRecord>, i64)>;

    async fn dashboard_totals(&self, day_start: DateTime<Utc>) -> StoreResult<DashboardTotals>;

    // === Site settings ===

    /// Get-or-create the settings singleton
    async fn site_settings(&self) -> StoreResult<SiteSettings>;

    async fn update_site_settings(&self, changes: &SiteSettingsChanges)
        -> StoreResult<SiteSettings>;

    // === Admins and sessions ===

    async fn insert_admin(&self, username: &str, password_hash: &str) -> StoreResult<AdminUser>;

    async fn find_admin(&self, id: Uuid) -> StoreResult<Option<AdminUser>>;

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<AdminUser>>;

    async fn insert_session(&self, session: &AdminSession) -> StoreResult<()>;

    async fn find_session(&self, token_hash: &str) -> StoreResult<Option<AdminSession>>;

    async fn delete_session(&self, token_hash: &str) -> StoreResult<()>;

    /// Remove sessions that expired before `now`; returns how many.
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}
