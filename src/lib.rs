//! bankdesk Library
//!
//! Re-exports modules for the server binary and integration testing.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod handlers;
pub mod jobs;
pub mod ledger;
pub mod store;

pub use config::Config;
pub use domain::{Amount, AmountError, DomainError, OperationContext};
pub use error::{AppError, AppResult, ErrorResponse};
