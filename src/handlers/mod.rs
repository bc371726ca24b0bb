//! Command Handlers module
//!
//! Command handlers orchestrate business operations: they validate the
//! command, consult the store and hand balance movements to the ledger.

mod book_transfer_handler;
mod commands;
mod credentials_handler;
mod delete_customer_handler;
mod deposit_handler;
mod registration_handler;
mod transfer_handler;
mod update_customer_handler;

pub use book_transfer_handler::BookTransferHandler;
pub use commands::*;
pub use credentials_handler::CredentialsHandler;
pub use delete_customer_handler::DeleteCustomerHandler;
pub use deposit_handler::DepositHandler;
pub use registration_handler::RegisterCustomerHandler;
pub use transfer_handler::{transfer_fee, CustomerTransferHandler};
pub use update_customer_handler::UpdateCustomerHandler;

use crate::domain::{AccountNumber, Amount, DomainError};

/// Parse the `amount` field, which may be a JSON string or number.
pub(crate) fn amount_field(value: Option<&serde_json::Value>) -> Result<Amount, DomainError> {
    match value {
        None | Some(serde_json::Value::Null) => Err(DomainError::MissingField("amount")),
        Some(v) => Ok(Amount::from_json(v)?),
    }
}

/// Parse a 10-digit account number field.
pub(crate) fn account_number_field(
    field: &'static str,
    raw: &str,
) -> Result<AccountNumber, DomainError> {
    raw.parse().map_err(|e: crate::domain::InvalidAccountNumber| DomainError::InvalidField {
        field,
        reason: e.to_string(),
    })
}
