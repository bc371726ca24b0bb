//! Customer accounts
//!
//! A customer is both an identity and the holder of exactly one account.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountNumber;

/// Stored customer record, including credential hashes.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: Uuid,
    pub account_number: AccountNumber,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub postal_code: Option<String>,
    pub balance: Decimal,
    pub currency: String,
    pub password_hash: String,
    pub pin_hash: String,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn profile(&self) -> CustomerProfile {
        CustomerProfile::from(self)
    }
}

/// Public view of a customer. Credential hashes are never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub id: Uuid,
    pub account_number: AccountNumber,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub postal_code: Option<String>,
    pub balance: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Customer> for CustomerProfile {
    fn from(c: &Customer) -> Self {
        Self {
            id: c.id,
            account_number: c.account_number.clone(),
            name: c.name.clone(),
            email: c.email.clone(),
            phone: c.phone.clone(),
            address: c.address.clone(),
            city: c.city.clone(),
            state: c.state.clone(),
            country: c.country.clone(),
            postal_code: c.postal_code.clone(),
            balance: c.balance,
            currency: c.currency.clone(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Everything needed to insert a customer; hashes are computed by the caller.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub account_number: AccountNumber,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub postal_code: Option<String>,
    pub currency: String,
    pub password_hash: String,
    pub pin_hash: String,
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub currency: Option<String>,
    pub password_hash: Option<String>,
    pub pin_hash: Option<String>,
}

impl CustomerChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the changes to an in-memory record.
    pub fn apply_to(&self, customer: &mut Customer) {
        fn set(target: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }
        fn set_opt(target: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value {
                *target = Some(v.clone());
            }
        }

        set(&mut customer.name, &self.name);
        set(&mut customer.email, &self.email);
        set_opt(&mut customer.phone, &self.phone);
        set(&mut customer.address, &self.address);
        set(&mut customer.city, &self.city);
        set_opt(&mut customer.state, &self.state);
        set(&mut customer.country, &self.country);
        set_opt(&mut customer.postal_code, &self.postal_code);
        set(&mut customer.currency, &self.currency);
        set(&mut customer.password_hash, &self.password_hash);
        set(&mut customer.pin_hash, &self.pin_hash);
    }
}

/// Listing filter for the admin customer table
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    /// Case-insensitive match on name, email or account number
    pub search: Option<String>,
}

impl CustomerFilter {
    pub fn matches(&self, customer: &Customer) -> bool {
        match &self.search {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                customer.name.to_lowercase().contains(&term)
                    || customer.email.contains(&term)
                    || customer.account_number.as_str().contains(&term)
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_customer(balance: Decimal) -> Customer {
    let now = Utc::now();
    Customer {
        id: Uuid::new_v4(),
        account_number: AccountNumber::generate(),
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: None,
        address: "12 St James's Square".to_string(),
        city: "London".to_string(),
        state: None,
        country: "GB".to_string(),
        postal_code: None,
        balance,
        currency: "USD".to_string(),
        password_hash: "password-hash".to_string(),
        pin_hash: "pin-hash".to_string(),
        is_system: false,
        created_at: now,
        updated_at: now,
    }
}
