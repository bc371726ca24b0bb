//! Credentials Handler
//!
//! Password and transaction PIN changes for an authenticated customer.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::SecretHasher;
use crate::domain::{validation, CustomerChanges, DomainError, OperationContext};
use crate::error::AppError;
use crate::store::BankStore;

use super::{ChangePasswordCommand, ChangePinCommand};

pub struct CredentialsHandler {
    store: Arc<dyn BankStore>,
    hasher: SecretHasher,
}

impl CredentialsHandler {
    pub fn new(store: Arc<dyn BankStore>, hasher: SecretHasher) -> Self {
        Self { store, hasher }
    }

    pub async fn change_password(
        &self,
        customer_id: Uuid,
        command: ChangePasswordCommand,
        context: &OperationContext,
    ) -> Result<(), AppError> {
        let current = command
            .current_password
            .filter(|p| !p.is_empty())
            .ok_or(DomainError::MissingField("current_password"))?;
        let new = command
            .new_password
            .filter(|p| !p.is_empty())
            .ok_or(DomainError::MissingField("new_password"))?;
        validation::password(&new)?;

        let customer = self
            .store
            .find_customer(customer_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !self.hasher.verify(&current, &customer.password_hash) {
            return Err(DomainError::IncorrectPassword.into());
        }
        if new == current {
            return Err(DomainError::SecretReused("password").into());
        }

        let changes = CustomerChanges {
            password_hash: Some(self.hasher.hash(&new)?),
            ..Default::default()
        };
        self.store.update_customer(customer_id, &changes).await?;

        tracing::info!(
            customer_id = %customer_id,
            request_id = %context.request_id(),
            "Password changed"
        );
        Ok(())
    }

    pub async fn change_pin(
        &self,
        customer_id: Uuid,
        command: ChangePinCommand,
        context: &OperationContext,
    ) -> Result<(), AppError> {
        let current = validation::required("current_pin", command.current_pin.as_deref())?;
        let new = validation::required("new_pin", command.new_pin.as_deref())?;
        validation::pin("new_pin", &new)?;

        let customer = self
            .store
            .find_customer(customer_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !self.hasher.verify(&current, &customer.pin_hash) {
            return Err(DomainError::InvalidPin.into());
        }
        if new == current {
            return Err(DomainError::SecretReused("PIN").into());
        }

        let changes = CustomerChanges {
            pin_hash: Some(self.hasher.hash(&new)?),
            ..Default::default()
        };
        self.store.update_customer(customer_id, &changes).await?;

        tracing::info!(
            customer_id = %customer_id,
            request_id = %context.request_id(),
            "Transaction PIN changed"
        );
        Ok(())
    }
}
