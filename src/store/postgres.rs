//! Postgres store
//!
//! Balance mutations are single `UPDATE ... SET balance = balance +/- $n`
//! statements inside one transaction, with both rows locked in id order
//! first, so concurrent movements neither lose updates nor deadlock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{BankStore, DashboardTotals, StoreError, StoreResult};
use crate::domain::{
    AccountNumber, AdminSession, AdminUser, Customer, CustomerChanges, CustomerFilter, Movement,
    NewCustomer, Page, SiteSettings, SiteSettingsChanges, TransactionKind, TransactionRecord,
};

const CUSTOMER_COLUMNS: &str = r#"
    id, account_number, name, email, phone, address, city, state, country, postal_code,
    balance, currency, password_hash, pin_hash, is_system, created_at, updated_at
"#;

const TRANSACTION_COLUMNS: &str = r#"
    id, kind, from_customer_id, to_customer_id, from_account_number, to_account_number,
    amount, description, created_at
"#;

const SETTINGS_COLUMNS: &str =
    "site_name, contact_email, contact_phone, address, city, country, updated_at";

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: Uuid,
    account_number: String,
    name: String,
    email: String,
    phone: Option<String>,
    address: String,
    city: String,
    state: Option<String>,
    country: String,
    postal_code: Option<String>,
    balance: Decimal,
    currency: String,
    password_hash: String,
    pin_hash: String,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = StoreError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        Ok(Customer {
            id: row.id,
            account_number: decode_account_number(row.account_number)?,
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            city: row.city,
            state: row.state,
            country: row.country,
            postal_code: row.postal_code,
            balance: row.balance,
            currency: row.currency,
            password_hash: row.password_hash,
            pin_hash: row.pin_hash,
            is_system: row.is_system,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: Uuid,
    kind: String,
    from_customer_id: Option<Uuid>,
    to_customer_id: Option<Uuid>,
    from_account_number: String,
    to_account_number: String,
    amount: Decimal,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(TransactionRecord {
            id: row.id,
            kind: TransactionKind::from(row.kind),
            from_customer_id: row.from_customer_id,
            to_customer_id: row.to_customer_id,
            from_account_number: decode_account_number(row.from_account_number)?,
            to_account_number: decode_account_number(row.to_account_number)?,
            amount: row.amount,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SettingsRow {
    site_name: String,
    contact_email: String,
    contact_phone: String,
    address: String,
    city: String,
    country: String,
    updated_at: DateTime<Utc>,
}

impl From<SettingsRow> for SiteSettings {
    fn from(row: SettingsRow) -> Self {
        SiteSettings {
            site_name: row.site_name,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            address: row.address,
            city: row.city,
            country: row.country,
            updated_at: row.updated_at,
        }
    }
}

fn decode_account_number(raw: String) -> Result<AccountNumber, StoreError> {
    AccountNumber::try_from(raw).map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))
}

fn customers(rows: Vec<CustomerRow>) -> StoreResult<Vec<Customer>> {
    rows.into_iter().map(Customer::try_from).collect()
}

fn transactions(rows: Vec<TransactionRow>) -> StoreResult<Vec<TransactionRecord>> {
    rows.into_iter().map(TransactionRecord::try_from).collect()
}

/// Translate unique violations (SQLSTATE 23505) into `Conflict`.
fn map_unique(err: sqlx::Error, fallback: &'static str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23505") {
            let constraint = db.constraint().unwrap_or_default();
            let field = if constraint.contains("email") {
                "email"
            } else if constraint.contains("account_number") {
                "account_number"
            } else if constraint.contains("username") {
                "username"
            } else {
                fallback
            };
            return StoreError::Conflict(field);
        }
    }
    StoreError::Database(err)
}

/// `%term%` for ILIKE, with wildcard characters in the term escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Store backed by Postgres
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BankStore for PgStore {
    async fn insert_customer(&self, new: NewCustomer) -> StoreResult<Customer> {
        let row: CustomerRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO customers (
                id, account_number, name, email, phone, address, city, state, country,
                postal_code, currency, password_hash, pin_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(new.account_number.as_str())
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.address)
        .bind(&new.city)
        .bind(&new.state)
        .bind(&new.country)
        .bind(&new.postal_code)
        .bind(&new.currency)
        .bind(&new.password_hash)
        .bind(&new.pin_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "customer"))?;

        row.try_into()
    }

    async fn find_customer(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    async fn find_customer_by_email(&self, email: &str) -> StoreResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM customers WHERE email = LOWER($1)",
            CUSTOMER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    async fn find_customer_by_account_number(
        &self,
        number: &AccountNumber,
    ) -> StoreResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM customers WHERE account_number = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(number.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page: Page,
    ) -> StoreResult<(Vec<Customer>, i64)> {
        let pattern = filter.search.as_deref().map(like_pattern);

        let rows: Vec<CustomerRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM customers
            WHERE NOT is_system
              AND ($1::text IS NULL
                   OR name ILIKE $1 OR email ILIKE $1 OR account_number LIKE $1)
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM customers
            WHERE NOT is_system
              AND ($1::text IS NULL
                   OR name ILIKE $1 OR email ILIKE $1 OR account_number LIKE $1)
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((customers(rows)?, total))
    }

    async fn update_customer(
        &self,
        id: Uuid,
        changes: &CustomerChanges,
    ) -> StoreResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            r#"
            UPDATE customers SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                city = COALESCE($6, city),
                state = COALESCE($7, state),
                country = COALESCE($8, country),
                postal_code = COALESCE($9, postal_code),
                currency = COALESCE($10, currency),
                password_hash = COALESCE($11, password_hash),
                pin_hash = COALESCE($12, pin_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(&changes.address)
        .bind(&changes.city)
        .bind(&changes.state)
        .bind(&changes.country)
        .bind(&changes.postal_code)
        .bind(&changes.currency)
        .bind(&changes.password_hash)
        .bind(&changes.pin_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique(e, "email"))?;

        row.map(Customer::try_from).transpose()
    }

    async fn delete_customer(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn system_account(&self) -> StoreResult<Customer> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM customers WHERE is_system LIMIT 1",
            CUSTOMER_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(StoreError::MissingSystemRecord("system bank account"))?
            .try_into()
    }

    async fn apply_movement(&self, movement: &Movement) -> StoreResult<TransactionRecord> {
        let amount = movement.amount.value();
        let mut tx = self.pool.begin().await?;

        // Lock both rows in a stable order before touching balances
        let mut ids = [movement.from, movement.to];
        ids.sort();
        let locked: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM customers WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(&ids[..])
                .fetch_all(&mut *tx)
                .await?;

        for id in [movement.from, movement.to] {
            if !locked.contains(&id) {
                return Err(StoreError::CustomerNotFound(id));
            }
        }

        let from_account_number: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE customers
            SET balance = balance - $2, updated_at = NOW()
            WHERE id = $1 AND (NOT $3 OR balance >= $2)
            RETURNING account_number
            "#,
        )
        .bind(movement.from)
        .bind(amount)
        .bind(movement.enforce_funds)
        .fetch_optional(&mut *tx)
        .await?;

        // The row is locked and exists, so a miss means the guard failed
        let from_account_number =
            from_account_number.ok_or(StoreError::InsufficientFunds(movement.from))?;

        let to_account_number: String = sqlx::query_scalar(
            r#"
            UPDATE customers
            SET balance = balance + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING account_number
            "#,
        )
        .bind(movement.to)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        let row: TransactionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO transactions (
                id, kind, from_customer_id, to_customer_id,
                from_account_number, to_account_number, amount, description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(movement.kind.as_str())
        .bind(movement.from)
        .bind(movement.to)
        .bind(&from_account_number)
        .bind(&to_account_number)
        .bind(amount)
        .bind(&movement.description)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    async fn customer_transactions(
        &self,
        customer_id: Uuid,
        page: Page,
    ) -> StoreResult<(Vec<TransactionRecord>, i64)> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE from_customer_id = $1 OR to_customer_id = $1
            ORDER BY seq DESC
            LIMIT $2 OFFSET $3
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(customer_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE from_customer_id = $1 OR to_customer_id = $1",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((transactions(rows)?, total))
    }

    async fn customer_transactions_since(
        &self,
        customer_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<TransactionRecord>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE (from_customer_id = $1 OR to_customer_id = $1)
              AND created_at >= $2
            ORDER BY seq ASC
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(customer_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        transactions(rows)
    }

    async fn outgoing_total_since(
        &self,
        customer_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE from_customer_id = $1 AND created_at >= $2
            "#,
        )
        .bind(customer_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn list_transactions(&self, page: Page) -> StoreResult<(Vec<TransactionRecord>, i64)> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions ORDER BY seq DESC LIMIT $1 OFFSET $2",
            TRANSACTION_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok((transactions(rows)?, total))
    }

    async fn dashboard_totals(&self, day_start: DateTime<Utc>) -> StoreResult<DashboardTotals> {
        let (
            total_customers,
            total_balance,
            total_transactions,
            total_deposits,
            total_deposit_amount,
            transactions_today,
        ): (i64, Decimal, i64, i64, Decimal, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM customers WHERE NOT is_system),
                (SELECT COALESCE(SUM(balance), 0) FROM customers WHERE NOT is_system),
                (SELECT COUNT(*) FROM transactions),
                (SELECT COUNT(*) FROM transactions WHERE kind = 'deposit'),
                (SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE kind = 'deposit'),
                (SELECT COUNT(*) FROM transactions WHERE created_at >= $1)
            "#,
        )
        .bind(day_start)
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardTotals {
            total_customers,
            total_balance,
            total_transactions,
            total_deposits,
            total_deposit_amount,
            transactions_today,
        })
    }

    async fn site_settings(&self) -> StoreResult<SiteSettings> {
        let initial = SiteSettings::initial();

        // The single-row key makes concurrent first reads converge on one row
        sqlx::query(
            r#"
            INSERT INTO site_settings (id, site_name)
            VALUES (TRUE, $1)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&initial.site_name)
        .execute(&self.pool)
        .await?;

        let row: SettingsRow = sqlx::query_as(&format!(
            "SELECT {} FROM site_settings WHERE id",
            SETTINGS_COLUMNS
        ))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_site_settings(
        &self,
        changes: &SiteSettingsChanges,
    ) -> StoreResult<SiteSettings> {
        self.site_settings().await?;

        let row: SettingsRow = sqlx::query_as(&format!(
            r#"
            UPDATE site_settings SET
                site_name = COALESCE($1, site_name),
                contact_email = COALESCE($2, contact_email),
                contact_phone = COALESCE($3, contact_phone),
                address = COALESCE($4, address),
                city = COALESCE($5, city),
                country = COALESCE($6, country),
                updated_at = NOW()
            WHERE id
            RETURNING {}
            "#,
            SETTINGS_COLUMNS
        ))
        .bind(&changes.site_name)
        .bind(&changes.contact_email)
        .bind(&changes.contact_phone)
        .bind(&changes.address)
        .bind(&changes.city)
        .bind(&changes.country)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn insert_admin(&self, username: &str, password_hash: &str) -> StoreResult<AdminUser> {
        let (id, created_at): (Uuid, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO admin_users (id, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "username"))?;

        Ok(AdminUser {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at,
        })
    }

    async fn find_admin(&self, id: Uuid) -> StoreResult<Option<AdminUser>> {
        let row: Option<(Uuid, String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, username, password_hash, created_at FROM admin_users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, username, password_hash, created_at)| AdminUser {
            id,
            username,
            password_hash,
            created_at,
        }))
    }

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<AdminUser>> {
        let row: Option<(Uuid, String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, username, password_hash, created_at FROM admin_users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, username, password_hash, created_at)| AdminUser {
            id,
            username,
            password_hash,
            created_at,
        }))
    }

    async fn insert_session(&self, session: &AdminSession) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO admin_sessions (token_hash, admin_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&session.token_hash)
        .bind(session.admin_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> StoreResult<Option<AdminSession>> {
        let row: Option<(String, Uuid, DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT token_hash, admin_id, created_at, expires_at
            FROM admin_sessions
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(token_hash, admin_id, created_at, expires_at)| AdminSession {
            token_hash,
            admin_id,
            created_at,
            expires_at,
        }))
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM admin_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
