//! Transaction records
//!
//! A transaction is an immutable balance movement between two accounts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountNumber, Amount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Credit from the system bank account
    Deposit,
    /// Movement between two customer accounts
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Transfer => "transfer",
        }
    }
}

impl From<String> for TransactionKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "deposit" => TransactionKind::Deposit,
            _ => TransactionKind::Transfer,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a transaction relative to one customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Credit,
    Debit,
}

/// Stored transaction. Customer ids become `None` if the customer is deleted;
/// the copied account numbers keep the history readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub from_customer_id: Option<Uuid>,
    pub to_customer_id: Option<Uuid>,
    pub from_account_number: AccountNumber,
    pub to_account_number: AccountNumber,
    pub amount: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Direction for `customer_id`, or `None` if the customer is not a party.
    pub fn direction_for(&self, customer_id: Uuid) -> Option<Direction> {
        if self.to_customer_id == Some(customer_id) {
            Some(Direction::Credit)
        } else if self.from_customer_id == Some(customer_id) {
            Some(Direction::Debit)
        } else {
            None
        }
    }

    /// Signed effect of this transaction on `customer_id`'s balance.
    pub fn signed_amount_for(&self, customer_id: Uuid) -> Decimal {
        match self.direction_for(customer_id) {
            Some(Direction::Credit) => self.amount,
            Some(Direction::Debit) => -self.amount,
            None => Decimal::ZERO,
        }
    }
}

/// A transaction as seen by one of its parties
#[derive(Debug, Clone, Serialize)]
pub struct CustomerTransaction {
    #[serde(flatten)]
    pub record: TransactionRecord,
    pub direction: Direction,
}

impl CustomerTransaction {
    pub fn for_customer(record: TransactionRecord, customer_id: Uuid) -> Option<Self> {
        record
            .direction_for(customer_id)
            .map(|direction| Self { record, direction })
    }
}

/// A balance movement the store must commit atomically: debit `from`,
/// credit `to`, record the transaction.
#[derive(Debug, Clone)]
pub struct Movement {
    pub kind: TransactionKind,
    pub from: Uuid,
    pub to: Uuid,
    pub amount: Amount,
    pub description: Option<String>,
    /// Refuse the debit if it would take `from` below zero
    pub enforce_funds: bool,
}
