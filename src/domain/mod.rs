//! Domain module
//!
//! Core domain types and business rules.

pub mod account_number;
pub mod amount;
pub mod context;
pub mod customer;
pub mod error;
pub mod identity;
pub mod page;
pub mod settings;
pub mod transaction;
pub mod validation;

pub use account_number::{mask_account, AccountNumber, InvalidAccountNumber};
pub use amount::{money, Amount, AmountError};
pub use context::OperationContext;
pub use customer::{Customer, CustomerChanges, CustomerFilter, CustomerProfile, NewCustomer};
pub use error::DomainError;
pub use identity::{AdminProfile, AdminSession, AdminUser, Identity, Role};
pub use page::{Page, Pagination};
pub use settings::{SiteSettings, SiteSettingsChanges};
pub use transaction::{
    CustomerTransaction, Direction, Movement, TransactionKind, TransactionRecord,
};
