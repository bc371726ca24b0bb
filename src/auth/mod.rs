//! Authentication primitives
//!
//! Credential hashing, customer bearer tokens and admin session tokens.

pub mod password;
pub mod session;
pub mod token;

pub use password::SecretHasher;
pub use session::{hash_session_token, new_session_token};
pub use token::{Claims, IssuedToken, TokenSigner};

/// Authentication failures. The API layer collapses all of these except
/// `Hashing` into one generic 401 so callers cannot tell them apart.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    Missing,

    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Unknown subject")]
    UnknownSubject,

    #[error("Credential hashing failed: {0}")]
    Hashing(String),
}
