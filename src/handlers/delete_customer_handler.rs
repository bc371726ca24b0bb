//! Delete Customer Handler
//!
//! Hard-deletes a customer. Transactions survive with the customer reference
//! cleared and the copied account number intact.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{DomainError, OperationContext};
use crate::error::AppError;
use crate::store::BankStore;

pub struct DeleteCustomerHandler {
    store: Arc<dyn BankStore>,
}

impl DeleteCustomerHandler {
    pub fn new(store: Arc<dyn BankStore>) -> Self {
        Self { store }
    }

    /// Execute the delete command
    pub async fn execute(&self, customer_id: Uuid, context: &OperationContext) -> Result<(), AppError> {
        let customer = self
            .store
            .find_customer(customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        if customer.is_system {
            return Err(DomainError::SystemAccount.into());
        }

        if !self.store.delete_customer(customer_id).await? {
            return Err(AppError::NotFound("Customer".to_string()));
        }

        tracing::info!(
            customer_id = %customer_id,
            account_number = %customer.account_number.masked(),
            balance = %customer.balance,
            actor = %context.actor_label(),
            request_id = %context.request_id(),
            "Customer deleted"
        );

        Ok(())
    }
}
