//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use super::AmountError;

/// Business rule violations and validation failures.
///
/// These errors are independent of the web/infrastructure layer; the API
/// layer maps each variant onto an HTTP status.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A required request field is missing or blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A field is present but malformed
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Invalid amount (zero, negative, too precise, or too large)
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// Insufficient balance for debit operation
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    /// Customer not found
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Transfer to the caller's own account
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    /// Transaction PIN did not match
    #[error("Invalid transaction PIN")]
    InvalidPin,

    /// Current password did not match
    #[error("Current password is incorrect")]
    IncorrectPassword,

    /// New secret is identical to the current one
    #[error("New {0} must be different from the current one")]
    SecretReused(&'static str),

    /// Outgoing transfers for the day would exceed the configured limit
    #[error("Daily transfer limit exceeded: limit {limit}, already sent {sent_today}")]
    DailyLimitExceeded { limit: Decimal, sent_today: Decimal },

    /// Email already registered
    #[error("A customer with this email already exists")]
    DuplicateEmail,

    /// The system bank account cannot be modified through the API
    #[error("The system bank account cannot be modified")]
    SystemAccount,
}

impl DomainError {
    /// Create an insufficient balance error
    pub fn insufficient_balance(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientBalance {
            required,
            available,
        }
    }

    /// Check if this is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::DuplicateEmail)
    }

    /// Check if this is a conflict error
    pub fn is_conflict_error(&self) -> bool {
        matches!(self, Self::DuplicateEmail)
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::InvalidField { .. } => "invalid_field",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::CustomerNotFound(_) => "customer_not_found",
            Self::SameAccountTransfer => "self_transfer",
            Self::InvalidPin => "invalid_pin",
            Self::IncorrectPassword => "incorrect_password",
            Self::SecretReused(_) => "secret_reused",
            Self::DailyLimitExceeded { .. } => "daily_limit_exceeded",
            Self::DuplicateEmail => "duplicate_email",
            Self::SystemAccount => "system_account",
        }
    }
}
