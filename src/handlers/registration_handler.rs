//! Registration Handler
//!
//! Creates customers with a freshly generated account number and hashed
//! credentials. Used by both self-registration and the admin portal.

use std::sync::Arc;

use crate::auth::SecretHasher;
use crate::domain::{
    validation, AccountNumber, Customer, DomainError, NewCustomer, OperationContext,
};
use crate::error::AppError;
use crate::store::{BankStore, StoreError};

use super::RegisterCustomerCommand;

/// Attempts at drawing an unused account number before giving up
const ACCOUNT_NUMBER_ATTEMPTS: usize = 5;

pub struct RegisterCustomerHandler {
    store: Arc<dyn BankStore>,
    hasher: SecretHasher,
    default_currency: String,
}

impl RegisterCustomerHandler {
    pub fn new(store: Arc<dyn BankStore>, hasher: SecretHasher, default_currency: String) -> Self {
        Self {
            store,
            hasher,
            default_currency,
        }
    }

    /// Execute the registration command. `allow_currency` is set on the
    /// admin path, where an explicit currency may be chosen.
    pub async fn execute(
        &self,
        command: RegisterCustomerCommand,
        allow_currency: bool,
        context: &OperationContext,
    ) -> Result<Customer, AppError> {
        let name = validation::required("name", command.name.as_deref())?;
        let email = validation::required("email", command.email.as_deref())?;
        let email = validation::email(&email)?;
        let password = command
            .password
            .filter(|p| !p.is_empty())
            .ok_or(DomainError::MissingField("password"))?;
        validation::password(&password)?;
        let address = validation::required("address", command.address.as_deref())?;
        let city = validation::required("city", command.city.as_deref())?;
        let country = validation::required("country", command.country.as_deref())?;
        let pin = validation::required("transaction_pin", command.transaction_pin.as_deref())?;
        validation::pin("transaction_pin", &pin)?;

        let currency = match validation::optional(command.currency.as_deref()) {
            Some(code) if allow_currency => validation::currency(&code)?,
            _ => self.default_currency.clone(),
        };

        // Cheap pre-check; the unique index settles races
        if self.store.find_customer_by_email(&email).await?.is_some() {
            return Err(DomainError::DuplicateEmail.into());
        }

        let password_hash = self.hasher.hash(&password)?;
        let pin_hash = self.hasher.hash(&pin)?;

        let new_customer = NewCustomer {
            account_number: AccountNumber::generate(),
            name,
            email,
            phone: validation::optional(command.phone.as_deref()),
            address,
            city,
            state: validation::optional(command.state.as_deref()),
            country,
            postal_code: validation::optional(command.postal_code.as_deref()),
            currency,
            password_hash,
            pin_hash,
        };

        let customer = self
            .insert_with_unique_number(new_customer, AccountNumber::generate)
            .await?;

        tracing::info!(
            customer_id = %customer.id,
            account_number = %customer.account_number.masked(),
            actor = %context.actor_label(),
            request_id = %context.request_id(),
            "Customer registered"
        );
        Ok(customer)
    }

    /// Insert `new_customer`, drawing a replacement account number from
    /// `draw` whenever the current one is already taken.
    async fn insert_with_unique_number(
        &self,
        mut new_customer: NewCustomer,
        mut draw: impl FnMut() -> AccountNumber,
    ) -> Result<Customer, AppError> {
        for attempt in 1..=ACCOUNT_NUMBER_ATTEMPTS {
            match self.store.insert_customer(new_customer.clone()).await {
                Ok(customer) => return Ok(customer),
                Err(StoreError::Conflict("account_number")) => {
                    tracing::debug!(attempt, "Account number collision, drawing another");
                    new_customer.account_number = draw();
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Internal(
            "could not allocate a unique account number".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn handler() -> RegisterCustomerHandler {
        handler_with(Arc::new(MemoryStore::new()))
    }

    fn handler_with(store: Arc<MemoryStore>) -> RegisterCustomerHandler {
        RegisterCustomerHandler::new(
            store,
            SecretHasher::with_costs(1024, 1, 1).unwrap(),
            "USD".to_string(),
        )
    }

    fn command(email: &str) -> RegisterCustomerCommand {
        RegisterCustomerCommand {
            name: Some("Grace Hopper".to_string()),
            email: Some(email.to_string()),
            password: Some("correct horse".to_string()),
            address: Some("1 Navy Way".to_string()),
            city: Some("Arlington".to_string()),
            country: Some("US".to_string()),
            transaction_pin: Some("1234".to_string()),
            currency: Some("eur".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_and_hashes() {
        let handler = handler();
        let customer = handler
            .execute(command(" Grace@Example.COM "), false, &OperationContext::new())
            .await
            .unwrap();

        assert_eq!(customer.email, "grace@example.com");
        assert_eq!(customer.currency, "USD");
        assert!(customer.password_hash.starts_with("$argon2id$"));
        assert!(handler.hasher.verify("1234", &customer.pin_hash));
        assert!(!customer.account_number.as_str().starts_with('0'));
    }

    #[tokio::test]
    async fn test_admin_path_honors_currency() {
        let customer = handler()
            .execute(command("grace@example.com"), true, &OperationContext::new())
            .await
            .unwrap();

        assert_eq!(customer.currency, "EUR");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let handler = handler();
        let ctx = OperationContext::new();
        handler.execute(command("grace@example.com"), false, &ctx).await.unwrap();

        let err = handler
            .execute(command("GRACE@example.com"), false, &ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Domain(DomainError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_missing_and_invalid_fields() {
        let handler = handler();
        let ctx = OperationContext::new();

        let mut missing_city = command("a@example.com");
        missing_city.city = Some("  ".to_string());
        let err = handler.execute(missing_city, false, &ctx).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::MissingField("city"))));

        let mut short_password = command("b@example.com");
        short_password.password = Some("short".to_string());
        let err = handler.execute(short_password, false, &ctx).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::InvalidField { field: "password", .. })));

        let mut bad_pin = command("c@example.com");
        bad_pin.transaction_pin = Some("12a4".to_string());
        let err = handler.execute(bad_pin, false, &ctx).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::InvalidField { field: "transaction_pin", .. })
        ));
    }

    fn new_customer(email: &str, account_number: &str) -> NewCustomer {
        NewCustomer {
            account_number: account_number.parse().unwrap(),
            name: "Grace Hopper".to_string(),
            email: email.to_string(),
            phone: None,
            address: "1 Navy Way".to_string(),
            city: "Arlington".to_string(),
            state: None,
            country: "US".to_string(),
            postal_code: None,
            currency: "USD".to_string(),
            password_hash: "hash".to_string(),
            pin_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_taken_account_number_is_redrawn() {
        let store = Arc::new(MemoryStore::new());
        let existing = store
            .insert_customer(new_customer("first@example.com", "1111111111"))
            .await
            .unwrap();
        let handler = handler_with(store.clone());

        let mut draws = vec!["3333333333", "2222222222", "1111111111"];
        let mut drawn = 0;
        let customer = handler
            .insert_with_unique_number(new_customer("second@example.com", "1111111111"), || {
                drawn += 1;
                draws.pop().unwrap().parse().unwrap()
            })
            .await
            .unwrap();

        // First redraw collides again, second one is free
        assert_eq!(drawn, 2);
        assert_eq!(customer.account_number.as_str(), "2222222222");
        assert_ne!(customer.account_number, existing.account_number);
        assert_eq!(
            store
                .find_customer_by_account_number(&customer.account_number)
                .await
                .unwrap()
                .map(|c| c.id),
            Some(customer.id)
        );
    }

    #[tokio::test]
    async fn test_gives_up_after_repeated_collisions() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_customer(new_customer("first@example.com", "1111111111"))
            .await
            .unwrap();
        let handler = handler_with(store.clone());

        let err = handler
            .insert_with_unique_number(new_customer("second@example.com", "1111111111"), || {
                "1111111111".parse().unwrap()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        let (_, total) = store
            .list_customers(&Default::default(), crate::domain::Page::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_registered_account_numbers_are_unique() {
        let handler = handler();
        let ctx = OperationContext::new();
        let mut seen = std::collections::HashSet::new();

        for i in 0..20 {
            let customer = handler
                .execute(command(&format!("user{}@example.com", i)), false, &ctx)
                .await
                .unwrap();
            assert!(seen.insert(customer.account_number));
        }
    }
}
