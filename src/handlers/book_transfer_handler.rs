//! Book Transfer Handler
//!
//! Committed peer transfers between two customer accounts, addressed by
//! account number. Only reachable from the admin portal.

use std::sync::Arc;

use crate::domain::{validation, AccountNumber, DomainError, OperationContext};
use crate::error::AppError;
use crate::ledger::TransferEngine;
use crate::store::BankStore;

use super::{account_number_field, amount_field, BookTransferCommand, BookTransferResult};

pub struct BookTransferHandler {
    store: Arc<dyn BankStore>,
    engine: TransferEngine,
}

impl BookTransferHandler {
    pub fn new(store: Arc<dyn BankStore>) -> Self {
        Self {
            engine: TransferEngine::new(store.clone()),
            store,
        }
    }

    /// Execute the book transfer command
    pub async fn execute(
        &self,
        command: BookTransferCommand,
        context: &OperationContext,
    ) -> Result<BookTransferResult, AppError> {
        let from = validation::required(
            "from_account_number",
            command.from_account_number.as_deref(),
        )?;
        let to = validation::required("to_account_number", command.to_account_number.as_deref())?;
        let from = account_number_field("from_account_number", &from)?;
        let to = account_number_field("to_account_number", &to)?;
        let amount = amount_field(command.amount.as_ref())?;

        if from == to {
            return Err(DomainError::SameAccountTransfer.into());
        }

        let from_id = self.resolve(&from).await?;
        let to_id = self.resolve(&to).await?;

        let receipt = self
            .engine
            .transfer(
                from_id,
                to_id,
                amount,
                validation::optional(command.description.as_deref()),
            )
            .await?;

        tracing::info!(
            transaction_id = %receipt.transaction.id,
            actor = %context.actor_label(),
            request_id = %context.request_id(),
            "Book transfer recorded"
        );

        Ok(BookTransferResult {
            transaction: receipt.transaction,
            from_balance: receipt.source_balance,
            to_balance: receipt.destination_balance,
        })
    }

    async fn resolve(&self, number: &AccountNumber) -> Result<uuid::Uuid, AppError> {
        self.store
            .find_customer_by_account_number(number)
            .await?
            .map(|customer| customer.id)
            .ok_or_else(|| DomainError::CustomerNotFound(number.masked()).into())
    }
}
