//! Account numbers
//!
//! Ten-digit customer account identifiers.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ACCOUNT_NUMBER_LEN: usize = 10;

/// Account number reserved for the system bank account
pub const SYSTEM_ACCOUNT_NUMBER: &str = "0000000000";

/// A validated 10-digit account number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Account number must be exactly {ACCOUNT_NUMBER_LEN} digits")]
pub struct InvalidAccountNumber;

impl AccountNumber {
    /// Generate a random customer account number. The leading digit is never
    /// zero, so generated numbers cannot collide with the system account.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut digits = String::with_capacity(ACCOUNT_NUMBER_LEN);
        digits.push(char::from(b'0' + rng.gen_range(1..=9u8)));
        for _ in 1..ACCOUNT_NUMBER_LEN {
            digits.push(char::from(b'0' + rng.gen_range(0..=9u8)));
        }
        Self(digits)
    }

    pub fn system() -> Self {
        Self(SYSTEM_ACCOUNT_NUMBER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Mask all but the last four digits, e.g. `******7890`.
    pub fn masked(&self) -> String {
        mask_account(&self.0)
    }
}

/// Mask any account identifier down to its last four characters.
pub fn mask_account(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let visible = chars.len().min(4);
    let hidden = chars.len() - visible;
    let mut masked = "*".repeat(hidden);
    masked.extend(&chars[hidden..]);
    masked
}

impl FromStr for AccountNumber {
    type Err = InvalidAccountNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() == ACCOUNT_NUMBER_LEN && s.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidAccountNumber)
        }
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = InvalidAccountNumber;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountNumber> for String {
    fn from(number: AccountNumber) -> Self {
        number.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
