//! Field validation shared by the customer and admin APIs.

use regex::Regex;
use std::sync::OnceLock;

use super::DomainError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const PIN_MIN_DIGITS: usize = 4;
pub const PIN_MAX_DIGITS: usize = 6;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"))
}

fn swift_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Z]{4}[A-Z]{2}[A-Z0-9]{2}([A-Z0-9]{3})?$").expect("valid SWIFT pattern")
    })
}

/// Require a non-blank value and return it trimmed.
pub fn required(field: &'static str, value: Option<&str>) -> Result<String, DomainError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DomainError::MissingField(field)),
    }
}

/// Trim an optional value, treating blank as absent.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate and normalize an email address (lower-cased).
pub fn email(value: &str) -> Result<String, DomainError> {
    let email = value.trim().to_lowercase();
    if email_regex().is_match(&email) {
        Ok(email)
    } else {
        Err(DomainError::InvalidField {
            field: "email",
            reason: "must be a valid email address".to_string(),
        })
    }
}

pub fn password(value: &str) -> Result<(), DomainError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::InvalidField {
            field: "password",
            reason: format!("must be at least {} characters", MIN_PASSWORD_LEN),
        });
    }
    Ok(())
}

/// Transaction PINs are 4-6 ASCII digits.
pub fn pin(field: &'static str, value: &str) -> Result<(), DomainError> {
    let len = value.len();
    if (PIN_MIN_DIGITS..=PIN_MAX_DIGITS).contains(&len) && value.chars().all(|c| c.is_ascii_digit())
    {
        Ok(())
    } else {
        Err(DomainError::InvalidField {
            field,
            reason: format!("must be {}-{} digits", PIN_MIN_DIGITS, PIN_MAX_DIGITS),
        })
    }
}

/// Validate a 3-letter currency code and return it upper-cased.
pub fn currency(value: &str) -> Result<String, DomainError> {
    let code = value.trim().to_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(DomainError::InvalidField {
            field: "currency",
            reason: "must be a 3-letter currency code".to_string(),
        })
    }
}

/// Validate a SWIFT/BIC code (8 or 11 characters) and return it upper-cased.
pub fn swift_code(value: &str) -> Result<String, DomainError> {
    let code = value.trim().to_uppercase();
    if swift_regex().is_match(&code) {
        Ok(code)
    } else {
        Err(DomainError::InvalidField {
            field: "swift_code",
            reason: "must be a valid 8 or 11 character SWIFT/BIC code".to_string(),
        })
    }
}

/// Foreign account identifiers (IBAN or domestic numbers) are 8-34 alphanumerics.
pub fn foreign_account(value: &str) -> Result<String, DomainError> {
    let account: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if (8..=34).contains(&account.len()) && account.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(account.to_uppercase())
    } else {
        Err(DomainError::InvalidField {
            field: "recipient_account_number",
            reason: "must be 8-34 letters or digits".to_string(),
        })
    }
}
