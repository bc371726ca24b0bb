//! Update Customer Handler
//!
//! Partial profile updates from the admin portal, including password and
//! PIN resets.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::SecretHasher;
use crate::domain::{validation, Customer, CustomerChanges, DomainError, OperationContext};
use crate::error::AppError;
use crate::store::BankStore;

use super::UpdateCustomerCommand;

pub struct UpdateCustomerHandler {
    store: Arc<dyn BankStore>,
    hasher: SecretHasher,
}

/// A present field must not be blank
fn non_blank(field: &'static str, value: Option<&str>) -> Result<Option<String>, DomainError> {
    value.map(|v| validation::required(field, Some(v))).transpose()
}

impl UpdateCustomerHandler {
    pub fn new(store: Arc<dyn BankStore>, hasher: SecretHasher) -> Self {
        Self { store, hasher }
    }

    /// Execute the update command
    pub async fn execute(
        &self,
        customer_id: Uuid,
        command: UpdateCustomerCommand,
        context: &OperationContext,
    ) -> Result<Customer, AppError> {
        let existing = self
            .store
            .find_customer(customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;
        if existing.is_system {
            return Err(DomainError::SystemAccount.into());
        }

        let mut changes = CustomerChanges {
            name: non_blank("name", command.name.as_deref())?,
            address: non_blank("address", command.address.as_deref())?,
            city: non_blank("city", command.city.as_deref())?,
            country: non_blank("country", command.country.as_deref())?,
            phone: command.phone.as_deref().map(|v| v.trim().to_string()),
            state: command.state.as_deref().map(|v| v.trim().to_string()),
            postal_code: command.postal_code.as_deref().map(|v| v.trim().to_string()),
            ..Default::default()
        };

        if let Some(email) = command.email.as_deref() {
            let email = validation::email(email)?;
            if let Some(other) = self.store.find_customer_by_email(&email).await? {
                if other.id != customer_id {
                    return Err(DomainError::DuplicateEmail.into());
                }
            }
            changes.email = Some(email);
        }
        if let Some(currency) = command.currency.as_deref() {
            changes.currency = Some(validation::currency(currency)?);
        }
        if let Some(password) = command.password.as_deref() {
            validation::password(password)?;
            changes.password_hash = Some(self.hasher.hash(password)?);
        }
        if let Some(pin) = command.transaction_pin.as_deref() {
            let pin = pin.trim();
            validation::pin("transaction_pin", pin)?;
            changes.pin_hash = Some(self.hasher.hash(pin)?);
        }

        if changes.is_empty() {
            return Ok(existing);
        }

        let updated = self
            .store
            .update_customer(customer_id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        tracing::info!(
            customer_id = %customer_id,
            password_reset = changes.password_hash.is_some(),
            pin_reset = changes.pin_hash.is_some(),
            actor = %context.actor_label(),
            request_id = %context.request_id(),
            "Customer updated"
        );

        Ok(updated)
    }
}
