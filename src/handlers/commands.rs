//! Command definitions
//!
//! Commands represent intentions to change the system state. Fields arrive
//! straight from JSON bodies, so most are optional here and checked by the
//! handler, which turns a missing field into a 400 naming it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::TransactionRecord;

// =========================================================================
// Registration
// =========================================================================

/// Create a customer, either by self-registration or from the admin portal
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterCustomerCommand {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub transaction_pin: Option<String>,
    /// Only honored on the admin path
    pub currency: Option<String>,
}

// =========================================================================
// Customer maintenance (admin)
// =========================================================================

/// Partial profile update. `password` and `transaction_pin` reset the
/// corresponding secret.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateCustomerCommand {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub currency: Option<String>,
    pub password: Option<String>,
    pub transaction_pin: Option<String>,
}

// =========================================================================
// Deposit
// =========================================================================

/// Credit a customer from the system bank account. The customer is
/// addressed by id or by account number.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DepositCommand {
    pub customer_id: Option<Uuid>,
    pub account_number: Option<String>,
    /// Decimal string or JSON number
    pub amount: Option<serde_json::Value>,
    pub description: Option<String>,
}

/// Result of a successful deposit
#[derive(Debug, Clone, Serialize)]
pub struct DepositResult {
    pub transaction: TransactionRecord,
    pub new_balance: Decimal,
}

// =========================================================================
// Book transfer (admin)
// =========================================================================

/// Committed peer transfer between two customer accounts
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookTransferCommand {
    pub from_account_number: Option<String>,
    pub to_account_number: Option<String>,
    pub amount: Option<serde_json::Value>,
    pub description: Option<String>,
}

/// Result of a successful book transfer
#[derive(Debug, Clone, Serialize)]
pub struct BookTransferResult {
    pub transaction: TransactionRecord,
    pub from_balance: Decimal,
    pub to_balance: Decimal,
}

// =========================================================================
// Customer transfer
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferType {
    Local,
    International,
}

/// Customer-initiated transfer request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerTransferCommand {
    pub transfer_type: Option<String>,
    pub recipient_account_number: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_bank: Option<String>,
    pub swift_code: Option<String>,
    pub amount: Option<serde_json::Value>,
    pub description: Option<String>,
    pub transaction_pin: Option<String>,
}

/// What a validated transfer would do. Reported in the service-unavailable
/// response since customer transfers are never executed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferQuote {
    pub reference: String,
    pub transfer_type: TransferType,
    /// Masked to the last four characters
    pub recipient_account: String,
    pub recipient_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_bank: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swift_code: Option<String>,
    pub amount: Decimal,
    pub fee: Decimal,
    pub total_debit: Decimal,
    pub currency: String,
}

// =========================================================================
// Credentials
// =========================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordCommand {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChangePinCommand {
    pub current_pin: Option<String>,
    pub new_pin: Option<String>,
}
