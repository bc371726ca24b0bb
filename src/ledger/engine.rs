//! Transfer/Deposit Engine
//!
//! Validates a balance movement against current account state, then hands it
//! to the store, which commits debit, credit and record in one transaction.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Amount, Customer, DomainError, Movement, TransactionKind, TransactionRecord};
use crate::error::AppError;
use crate::store::{BankStore, StoreError};

/// Outcome of a committed movement
#[derive(Debug, Clone, Serialize)]
pub struct LedgerReceipt {
    pub transaction: TransactionRecord,
    /// Source balance read back after the commit
    pub source_balance: Decimal,
    /// Destination balance read back after the commit
    pub destination_balance: Decimal,
}

#[derive(Clone)]
pub struct TransferEngine {
    store: Arc<dyn BankStore>,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn BankStore>) -> Self {
        Self { store }
    }

    /// Credit `customer_id` from the system bank account.
    pub async fn deposit(
        &self,
        customer_id: Uuid,
        amount: Amount,
        description: Option<String>,
    ) -> Result<LedgerReceipt, AppError> {
        let recipient = self.load(customer_id).await?;
        if recipient.is_system {
            return Err(DomainError::SystemAccount.into());
        }

        let bank = self.store.system_account().await?;

        let movement = Movement {
            kind: TransactionKind::Deposit,
            from: bank.id,
            to: recipient.id,
            amount,
            description: description.or_else(|| Some("Deposit".to_string())),
            enforce_funds: false,
        };

        let receipt = self.commit(movement).await?;

        tracing::info!(
            transaction_id = %receipt.transaction.id,
            customer_id = %customer_id,
            amount = %amount,
            new_balance = %receipt.destination_balance,
            "Deposit committed"
        );

        Ok(receipt)
    }

    /// Move `amount` between two customer accounts. The source must cover
    /// the amount; the store re-checks this atomically.
    pub async fn transfer(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        amount: Amount,
        description: Option<String>,
    ) -> Result<LedgerReceipt, AppError> {
        if from_id == to_id {
            return Err(DomainError::SameAccountTransfer.into());
        }

        let source = self.load(from_id).await?;
        let destination = self.load(to_id).await?;

        if source.is_system || destination.is_system {
            return Err(DomainError::SystemAccount.into());
        }

        if source.balance < amount.value() {
            return Err(DomainError::insufficient_balance(amount.value(), source.balance).into());
        }

        let movement = Movement {
            kind: TransactionKind::Transfer,
            from: source.id,
            to: destination.id,
            amount,
            description: description.or_else(|| Some("Transfer".to_string())),
            enforce_funds: true,
        };

        let receipt = self.commit(movement).await?;

        tracing::info!(
            transaction_id = %receipt.transaction.id,
            from = %from_id,
            to = %to_id,
            amount = %amount,
            "Transfer committed"
        );

        Ok(receipt)
    }

    async fn load(&self, id: Uuid) -> Result<Customer, AppError> {
        self.store
            .find_customer(id)
            .await?
            .ok_or_else(|| DomainError::CustomerNotFound(id.to_string()).into())
    }

    async fn commit(&self, movement: Movement) -> Result<LedgerReceipt, AppError> {
        let transaction = match self.store.apply_movement(&movement).await {
            Ok(record) => record,
            // Lost the race against a concurrent debit
            Err(StoreError::InsufficientFunds(id)) => {
                let available = self.load(id).await?.balance;
                return Err(
                    DomainError::insufficient_balance(movement.amount.value(), available).into(),
                );
            }
            Err(StoreError::CustomerNotFound(id)) => {
                return Err(DomainError::CustomerNotFound(id.to_string()).into());
            }
            Err(e) => return Err(e.into()),
        };

        let source_balance = self.load(movement.from).await?.balance;
        let destination_balance = self.load(movement.to).await?.balance;

        Ok(LedgerReceipt {
            transaction,
            source_balance,
            destination_balance,
        })
    }
}
