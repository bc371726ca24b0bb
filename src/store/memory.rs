//! In-process store
//!
//! Keeps every record behind one `RwLock`, so each operation (including
//! `apply_movement`) is atomic with respect to the others.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BankStore, DashboardTotals, StoreError, StoreResult};
use crate::domain::{
    money, AccountNumber, AdminSession, AdminUser, Customer, CustomerChanges, CustomerFilter,
    Direction, Movement, NewCustomer, Page, SiteSettings, SiteSettingsChanges, TransactionKind,
    TransactionRecord,
};

/// Opening balance of the system bank account
pub(crate) fn system_opening_balance() -> Decimal {
    Decimal::new(1_000_000_000_000_00, 2)
}

#[derive(Debug, Default)]
struct Inner {
    /// Insertion order; index 0 is the system account
    customers: Vec<Customer>,
    transactions: Vec<TransactionRecord>,
    settings: Option<SiteSettings>,
    admins: Vec<AdminUser>,
    sessions: Vec<AdminSession>,
}

impl Inner {
    fn customer(&self, id: Uuid) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    fn customer_mut(&mut self, id: Uuid) -> Option<&mut Customer> {
        self.customers.iter_mut().find(|c| c.id == id)
    }

    fn involving(&self, customer_id: Uuid) -> impl Iterator<Item = &TransactionRecord> + '_ {
        self.transactions
            .iter()
            .filter(move |t| t.direction_for(customer_id).is_some())
    }
}

fn paginate<T: Clone>(items: &[T], page: Page) -> Vec<T> {
    items
        .iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .cloned()
        .collect()
}

/// Store that lives entirely in memory
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create a store seeded with the system bank account.
    pub fn new() -> Self {
        let now = Utc::now();
        let system = Customer {
            id: Uuid::new_v4(),
            account_number: AccountNumber::system(),
            name: "System Bank Account".to_string(),
            email: "system@bank.internal".to_string(),
            phone: None,
            address: "-".to_string(),
            city: "-".to_string(),
            state: None,
            country: "-".to_string(),
            postal_code: None,
            balance: system_opening_balance(),
            currency: "USD".to_string(),
            // Not a PHC string, so no password or PIN ever verifies
            password_hash: "!".to_string(),
            pin_hash: "!".to_string(),
            is_system: true,
            created_at: now,
            updated_at: now,
        };

        Self {
            inner: RwLock::new(Inner {
                customers: vec![system],
                ..Default::default()
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BankStore for MemoryStore {
    async fn insert_customer(&self, new: NewCustomer) -> StoreResult<Customer> {
        let mut inner = self.inner.write().await;

        if inner.customers.iter().any(|c| c.email == new.email) {
            return Err(StoreError::Conflict("email"));
        }
        if inner
            .customers
            .iter()
            .any(|c| c.account_number == new.account_number)
        {
            return Err(StoreError::Conflict("account_number"));
        }

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            account_number: new.account_number,
            name: new.name,
            email: new.email,
            phone: new.phone,
            address: new.address,
            city: new.city,
            state: new.state,
            country: new.country,
            postal_code: new.postal_code,
            balance: money(Decimal::ZERO),
            currency: new.currency,
            password_hash: new.password_hash,
            pin_hash: new.pin_hash,
            is_system: false,
            created_at: now,
            updated_at: now,
        };
        inner.customers.push(customer.clone());
        Ok(customer)
    }

    async fn find_customer(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        Ok(self.inner.read().await.customer(id).cloned())
    }

    async fn find_customer_by_email(&self, email: &str) -> StoreResult<Option<Customer>> {
        let email = email.to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner.customers.iter().find(|c| c.email == email).cloned())
    }

    async fn find_customer_by_account_number(
        &self,
        number: &AccountNumber,
    ) -> StoreResult<Option<Customer>> {
        let inner = self.inner.read().await;
        Ok(inner
            .customers
            .iter()
            .find(|c| &c.account_number == number)
            .cloned())
    }

    async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page: Page,
    ) -> StoreResult<(Vec<Customer>, i64)> {
        let inner = self.inner.read().await;
        let matching: Vec<Customer> = inner
            .customers
            .iter()
            .rev()
            .filter(|c| !c.is_system && filter.matches(c))
            .cloned()
            .collect();
        Ok((paginate(&matching, page), matching.len() as i64))
    }

    async fn update_customer(
        &self,
        id: Uuid,
        changes: &CustomerChanges,
    ) -> StoreResult<Option<Customer>> {
        let mut inner = self.inner.write().await;

        if let Some(email) = &changes.email {
            if inner.customers.iter().any(|c| c.id != id && &c.email == email) {
                return Err(StoreError::Conflict("email"));
            }
        }

        Ok(inner.customer_mut(id).map(|customer| {
            changes.apply_to(customer);
            customer.updated_at = Utc::now();
            customer.clone()
        }))
    }

    async fn delete_customer(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.customers.len();
        inner.customers.retain(|c| c.id != id);
        let removed = inner.customers.len() != before;

        if removed {
            for tx in inner.transactions.iter_mut() {
                if tx.from_customer_id == Some(id) {
                    tx.from_customer_id = None;
                }
                if tx.to_customer_id == Some(id) {
                    tx.to_customer_id = None;
                }
            }
        }
        Ok(removed)
    }

    async fn system_account(&self) -> StoreResult<Customer> {
        let inner = self.inner.read().await;
        inner
            .customers
            .iter()
            .find(|c| c.is_system)
            .cloned()
            .ok_or(StoreError::MissingSystemRecord("system bank account"))
    }

    async fn apply_movement(&self, movement: &Movement) -> StoreResult<TransactionRecord> {
        let mut inner = self.inner.write().await;
        let amount = movement.amount.value();

        let source = inner
            .customer(movement.from)
            .ok_or(StoreError::CustomerNotFound(movement.from))?;
        if movement.enforce_funds && source.balance < amount {
            return Err(StoreError::InsufficientFunds(movement.from));
        }
        let from_account_number = source.account_number.clone();

        let to_account_number = inner
            .customer(movement.to)
            .ok_or(StoreError::CustomerNotFound(movement.to))?
            .account_number
            .clone();

        let now = Utc::now();
        for (id, delta) in [(movement.from, -amount), (movement.to, amount)] {
            if let Some(customer) = inner.customer_mut(id) {
                customer.balance = money(customer.balance + delta);
                customer.updated_at = now;
            }
        }

        let record = TransactionRecord {
            id: Uuid::new_v4(),
            kind: movement.kind,
            from_customer_id: Some(movement.from),
            to_customer_id: Some(movement.to),
            from_account_number,
            to_account_number,
            amount,
            description: movement.description.clone(),
            created_at: now,
        };
        inner.transactions.push(record.clone());
        Ok(record)
    }

    async fn customer_transactions(
        &self,
        customer_id: Uuid,
        page: Page,
    ) -> StoreResult<(Vec<TransactionRecord>, i64)> {
        let inner = self.inner.read().await;
        let mut records: Vec<TransactionRecord> = inner.involving(customer_id).cloned().collect();
        records.reverse();
        Ok((paginate(&records, page), records.len() as i64))
    }

    async fn customer_transactions_since(
        &self,
        customer_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<TransactionRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .involving(customer_id)
            .filter(|t| t.created_at >= since)
            .cloned()
            .collect())
    }

    async fn outgoing_total_since(
        &self,
        customer_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<Decimal> {
        let inner = self.inner.read().await;
        Ok(inner
            .involving(customer_id)
            .filter(|t| t.created_at >= since)
            .filter(|t| t.direction_for(customer_id) == Some(Direction::Debit))
            .map(|t| t.amount)
            .sum())
    }

    async fn list_transactions(&self, page: Page) -> StoreResult<(Vec<TransactionRecord>, i64)> {
        let inner = self.inner.read().await;
        let records: Vec<TransactionRecord> = inner.transactions.iter().rev().cloned().collect();
        Ok((paginate(&records, page), records.len() as i64))
    }

    async fn dashboard_totals(&self, day_start: DateTime<Utc>) -> StoreResult<DashboardTotals> {
        let inner = self.inner.read().await;
        let customers = inner.customers.iter().filter(|c| !c.is_system);
        let deposits = inner
            .transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Deposit);

        Ok(DashboardTotals {
            total_customers: customers.clone().count() as i64,
            total_balance: money(customers.map(|c| c.balance).sum()),
            total_transactions: inner.transactions.len() as i64,
            total_deposits: deposits.clone().count() as i64,
            total_deposit_amount: money(deposits.map(|t| t.amount).sum()),
            transactions_today: inner
                .transactions
                .iter()
                .filter(|t| t.created_at >= day_start)
                .count() as i64,
        })
    }

    async fn site_settings(&self) -> StoreResult<SiteSettings> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .settings
            .get_or_insert_with(SiteSettings::initial)
            .clone())
    }

    async fn update_site_settings(
        &self,
        changes: &SiteSettingsChanges,
    ) -> StoreResult<SiteSettings> {
        let mut inner = self.inner.write().await;
        let settings = inner.settings.get_or_insert_with(SiteSettings::initial);
        changes.apply_to(settings);
        Ok(settings.clone())
    }

    async fn insert_admin(&self, username: &str, password_hash: &str) -> StoreResult<AdminUser> {
        let mut inner = self.inner.write().await;
        if inner.admins.iter().any(|a| a.username == username) {
            return Err(StoreError::Conflict("username"));
        }
        let admin = AdminUser {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        inner.admins.push(admin.clone());
        Ok(admin)
    }

    async fn find_admin(&self, id: Uuid) -> StoreResult<Option<AdminUser>> {
        let inner = self.inner.read().await;
        Ok(inner.admins.iter().find(|a| a.id == id).cloned())
    }

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<AdminUser>> {
        let inner = self.inner.read().await;
        Ok(inner.admins.iter().find(|a| a.username == username).cloned())
    }

    async fn insert_session(&self, session: &AdminSession) -> StoreResult<()> {
        self.inner.write().await.sessions.push(session.clone());
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> StoreResult<Option<AdminSession>> {
        let inner = self.inner.read().await;
        Ok(inner
            .sessions
            .iter()
            .find(|s| s.token_hash == token_hash)
            .cloned())
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .sessions
            .retain(|s| s.token_hash != token_hash);
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.sessions.len();
        inner.sessions.retain(|s| !s.is_expired(now));
        Ok((before - inner.sessions.len()) as u64)
    }
}
