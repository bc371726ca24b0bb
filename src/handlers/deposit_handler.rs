//! Deposit Handler
//!
//! Credits a customer account from the system bank account.

use std::sync::Arc;

use crate::domain::{validation, DomainError, OperationContext};
use crate::error::AppError;
use crate::ledger::TransferEngine;
use crate::store::BankStore;

use super::{account_number_field, amount_field, DepositCommand, DepositResult};

pub struct DepositHandler {
    store: Arc<dyn BankStore>,
    engine: TransferEngine,
}

impl DepositHandler {
    pub fn new(store: Arc<dyn BankStore>) -> Self {
        Self {
            engine: TransferEngine::new(store.clone()),
            store,
        }
    }

    /// Execute the deposit command
    pub async fn execute(
        &self,
        command: DepositCommand,
        context: &OperationContext,
    ) -> Result<DepositResult, AppError> {
        let amount = amount_field(command.amount.as_ref())?;

        let customer_id = match (command.customer_id, command.account_number.as_deref()) {
            (Some(id), _) => id,
            (None, Some(raw)) => {
                let number = account_number_field("account_number", raw)?;
                self.store
                    .find_customer_by_account_number(&number)
                    .await?
                    .ok_or_else(|| DomainError::CustomerNotFound(number.masked()))?
                    .id
            }
            (None, None) => return Err(DomainError::MissingField("customer_id").into()),
        };

        let receipt = self
            .engine
            .deposit(
                customer_id,
                amount,
                validation::optional(command.description.as_deref()),
            )
            .await?;

        tracing::info!(
            transaction_id = %receipt.transaction.id,
            actor = %context.actor_label(),
            request_id = %context.request_id(),
            "Admin deposit recorded"
        );

        Ok(DepositResult {
            transaction: receipt.transaction,
            new_balance: receipt.destination_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::sample_customer;
    use crate::domain::{NewCustomer, TransactionKind};
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;
    use serde_json::json;

    async fn seeded() -> (Arc<MemoryStore>, crate::domain::Customer) {
        let store = Arc::new(MemoryStore::new());
        let sample = sample_customer(dec!(0));
        let customer = store
            .insert_customer(NewCustomer {
                account_number: sample.account_number,
                name: sample.name,
                email: sample.email,
                phone: None,
                address: sample.address,
                city: sample.city,
                state: None,
                country: sample.country,
                postal_code: None,
                currency: sample.currency,
                password_hash: sample.password_hash,
                pin_hash: sample.pin_hash,
            })
            .await
            .unwrap();
        (store, customer)
    }

    #[tokio::test]
    async fn test_deposit_by_id_and_by_account_number() {
        let (store, customer) = seeded().await;
        let handler = DepositHandler::new(store.clone());
        let ctx = OperationContext::new();

        handler
            .execute(
                DepositCommand {
                    customer_id: Some(customer.id),
                    amount: Some(json!("100.00")),
                    ..Default::default()
                },
                &ctx,
            )
            .await
            .unwrap();

        let result = handler
            .execute(
                DepositCommand {
                    account_number: Some(customer.account_number.as_str().to_string()),
                    amount: Some(json!(50)),
                    description: Some("Branch cash".to_string()),
                    ..Default::default()
                },
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(result.new_balance, dec!(150.00));
        assert_eq!(result.transaction.kind, TransactionKind::Deposit);
        assert_eq!(result.transaction.to_customer_id, Some(customer.id));
        assert_eq!(result.transaction.amount, dec!(50.00));
    }

    #[tokio::test]
    async fn test_deposit_validation() {
        let (store, customer) = seeded().await;
        let handler = DepositHandler::new(store.clone());
        let ctx = OperationContext::new();

        let missing_target = handler
            .execute(
                DepositCommand {
                    amount: Some(json!("1.00")),
                    ..Default::default()
                },
                &ctx,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            missing_target,
            AppError::Domain(DomainError::MissingField(_))
        ));

        for bad in [json!("0"), json!(-5), json!("1.005"), json!("abc")] {
            let err = handler
                .execute(
                    DepositCommand {
                        customer_id: Some(customer.id),
                        amount: Some(bad),
                        ..Default::default()
                    },
                    &ctx,
                )
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Domain(DomainError::InvalidAmount(_))));
        }

        let unknown = handler
            .execute(
                DepositCommand {
                    account_number: Some("9999999999".to_string()),
                    amount: Some(json!("1.00")),
                    ..Default::default()
                },
                &ctx,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            unknown,
            AppError::Domain(DomainError::CustomerNotFound(_))
        ));

        let untouched = store.find_customer(customer.id).await.unwrap().unwrap();
        assert_eq!(untouched.balance, dec!(0));
    }
}
