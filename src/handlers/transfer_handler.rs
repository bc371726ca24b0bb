//! Customer Transfer Handler
//!
//! Runs the full validation pipeline for a customer-initiated transfer and
//! prices it. The transfer itself is never executed: a request that passes
//! every check is answered with 503 and the quote, and no balance changes.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::auth::SecretHasher;
use crate::domain::{mask_account, money, validation, Amount, DomainError, OperationContext};
use crate::error::AppError;
use crate::store::BankStore;

use super::{account_number_field, amount_field, CustomerTransferCommand, TransferQuote, TransferType};

/// International transfers cost 1% of the amount
fn international_fee_rate() -> Decimal {
    Decimal::new(1, 2)
}

/// Floor for the international fee
fn international_fee_minimum() -> Decimal {
    Decimal::new(500, 2)
}

const UNAVAILABLE_MESSAGE: &str =
    "Transfers are temporarily unavailable. Please try again later or contact support.";

/// Fee charged on top of `amount`, rounded to cents.
pub fn transfer_fee(transfer_type: TransferType, amount: Decimal) -> Decimal {
    match transfer_type {
        TransferType::Local => money(Decimal::ZERO),
        TransferType::International => {
            let fee = (amount * international_fee_rate())
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            money(fee.max(international_fee_minimum()))
        }
    }
}

fn new_reference() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("TRF{}{:06}", Utc::now().format("%Y%m%d%H%M%S"), suffix)
}

impl TransferQuote {
    /// The response every validated customer transfer receives
    pub fn unavailable(self) -> AppError {
        let details = serde_json::to_value(&self).unwrap_or(serde_json::Value::Null);
        AppError::ServiceUnavailable {
            message: UNAVAILABLE_MESSAGE.to_string(),
            details,
        }
    }
}

pub struct CustomerTransferHandler {
    store: Arc<dyn BankStore>,
    hasher: SecretHasher,
    daily_limit: Decimal,
}

impl CustomerTransferHandler {
    pub fn new(store: Arc<dyn BankStore>, hasher: SecretHasher, daily_limit: Decimal) -> Self {
        Self {
            store,
            hasher,
            daily_limit,
        }
    }

    /// Validate and price a transfer from `customer_id`. Checks run in a
    /// fixed order and the first failure is returned.
    pub async fn execute(
        &self,
        customer_id: Uuid,
        command: CustomerTransferCommand,
        context: &OperationContext,
    ) -> Result<TransferQuote, AppError> {
        // 1. Required fields
        let transfer_type = validation::required("transfer_type", command.transfer_type.as_deref())?;
        let recipient_raw = validation::required(
            "recipient_account_number",
            command.recipient_account_number.as_deref(),
        )?;
        let recipient_name =
            validation::required("recipient_name", command.recipient_name.as_deref())?;
        if command.amount.as_ref().map_or(true, |v| v.is_null()) {
            return Err(DomainError::MissingField("amount").into());
        }
        let pin = validation::required("transaction_pin", command.transaction_pin.as_deref())?;

        let transfer_type = match transfer_type.to_lowercase().as_str() {
            "local" => TransferType::Local,
            "international" => TransferType::International,
            _ => {
                return Err(DomainError::InvalidField {
                    field: "transfer_type",
                    reason: "must be local or international".to_string(),
                }
                .into())
            }
        };

        // 2. Amount
        let amount: Amount = amount_field(command.amount.as_ref())?;

        // 3. PIN format
        validation::pin("transaction_pin", &pin)?;

        // 4. Recipient account format
        let (recipient_account, local_recipient) = match transfer_type {
            TransferType::Local => {
                let number = account_number_field("recipient_account_number", &recipient_raw)?;
                (number.as_str().to_string(), Some(number))
            }
            TransferType::International => (validation::foreign_account(&recipient_raw)?, None),
        };

        // 5. SWIFT code
        let swift_code = match (
            transfer_type,
            validation::optional(command.swift_code.as_deref()),
        ) {
            (TransferType::International, None) => {
                return Err(DomainError::MissingField("swift_code").into())
            }
            (_, Some(code)) => Some(validation::swift_code(&code)?),
            (TransferType::Local, None) => None,
        };

        let sender = self
            .store
            .find_customer(customer_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        // 6. PIN matches
        if !self.hasher.verify(&pin, &sender.pin_hash) {
            tracing::warn!(
                customer_id = %customer_id,
                request_id = %context.request_id(),
                "Transfer rejected: invalid PIN"
            );
            return Err(DomainError::InvalidPin.into());
        }

        // 7. Not to self
        if recipient_account == sender.account_number.as_str() {
            return Err(DomainError::SameAccountTransfer.into());
        }

        // 8. Local recipient exists
        if let Some(number) = local_recipient {
            let recipient = self.store.find_customer_by_account_number(&number).await?;
            if !recipient.is_some_and(|r| !r.is_system) {
                return Err(DomainError::CustomerNotFound(number.masked()).into());
            }
        }

        // 9. Balance covers amount plus fee
        let fee = transfer_fee(transfer_type, amount.value());
        let total_debit = money(amount.value() + fee);
        if total_debit > sender.balance {
            return Err(DomainError::insufficient_balance(total_debit, sender.balance).into());
        }

        // 10. Daily limit
        let today = Utc::now().date_naive();
        let day_start = Utc.from_utc_datetime(&today.and_time(chrono::NaiveTime::MIN));
        let sent_today = self
            .store
            .outgoing_total_since(customer_id, day_start)
            .await?;
        if sent_today + amount.value() > self.daily_limit {
            return Err(DomainError::DailyLimitExceeded {
                limit: self.daily_limit,
                sent_today: money(sent_today),
            }
            .into());
        }

        let quote = TransferQuote {
            reference: new_reference(),
            transfer_type,
            recipient_account: mask_account(&recipient_account),
            recipient_name,
            recipient_bank: validation::optional(command.recipient_bank.as_deref()),
            swift_code,
            amount: amount.value(),
            fee,
            total_debit,
            currency: sender.currency.clone(),
        };

        tracing::info!(
            customer_id = %customer_id,
            reference = %quote.reference,
            transfer_type = ?transfer_type,
            amount = %quote.amount,
            fee = %quote.fee,
            request_id = %context.request_id(),
            "Customer transfer validated; execution unavailable"
        );

        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountNumber, Customer, NewCustomer, Page};
    use axum::http::StatusCode;
    use crate::ledger::TransferEngine;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;
    use serde_json::json;

    const PIN: &str = "4321";

    struct Fixture {
        store: Arc<MemoryStore>,
        handler: CustomerTransferHandler,
        sender: Customer,
        recipient: Customer,
    }

    async fn insert(store: &MemoryStore, hasher: &SecretHasher, email: &str) -> Customer {
        store
            .insert_customer(NewCustomer {
                account_number: AccountNumber::generate(),
                name: "Ada Lovelace".to_string(),
                email: email.to_string(),
                phone: None,
                address: "12 St James's Square".to_string(),
                city: "London".to_string(),
                state: None,
                country: "GB".to_string(),
                postal_code: None,
                currency: "USD".to_string(),
                password_hash: "unused".to_string(),
                pin_hash: hasher.hash(PIN).unwrap(),
            })
            .await
            .unwrap()
    }

    /// Sender holds 900.00 after sending 100.00 today; daily limit is 600.00.
    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let hasher = SecretHasher::with_costs(1024, 1, 1).unwrap();
        let sender = insert(&store, &hasher, "ada@example.com").await;
        let recipient = insert(&store, &hasher, "bob@example.com").await;

        let engine = TransferEngine::new(store.clone());
        engine
            .deposit(sender.id, Amount::new(dec!(1000)).unwrap(), None)
            .await
            .unwrap();
        engine
            .transfer(sender.id, recipient.id, Amount::new(dec!(100)).unwrap(), None)
            .await
            .unwrap();

        Fixture {
            handler: CustomerTransferHandler::new(store.clone(), hasher, dec!(600.00)),
            store,
            sender,
            recipient,
        }
    }

    fn local(to: &str, amount: &str) -> CustomerTransferCommand {
        CustomerTransferCommand {
            transfer_type: Some("local".to_string()),
            recipient_account_number: Some(to.to_string()),
            recipient_name: Some("Bob".to_string()),
            amount: Some(json!(amount)),
            transaction_pin: Some(PIN.to_string()),
            ..Default::default()
        }
    }

    fn international(amount: &str, swift_code: Option<&str>) -> CustomerTransferCommand {
        CustomerTransferCommand {
            transfer_type: Some("international".to_string()),
            recipient_account_number: Some("DE89370400440532013000".to_string()),
            recipient_name: Some("Hans".to_string()),
            swift_code: swift_code.map(str::to_string),
            amount: Some(json!(amount)),
            transaction_pin: Some(PIN.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pipeline_rejections_leave_balances_untouched() {
        let f = fixture().await;
        let own = f.sender.account_number.as_str().to_string();
        let bob = f.recipient.account_number.as_str().to_string();
        let ctx = OperationContext::new();

        let cases = vec![
            ("to self", local(&own, "10.00"), StatusCode::BAD_REQUEST, "self_transfer"),
            ("unknown recipient", local("1999999999", "10.00"), StatusCode::NOT_FOUND, "customer_not_found"),
            ("system recipient", local("0000000000", "10.00"), StatusCode::NOT_FOUND, "customer_not_found"),
            ("short recipient", local("12345", "10.00"), StatusCode::BAD_REQUEST, "invalid_field"),
            ("amount over balance", local(&bob, "900.01"), StatusCode::BAD_REQUEST, "insufficient_balance"),
            // 895.00 + 8.95 fee exceeds 900.00
            ("fee over balance", international("895.00", Some("COBADEFF")), StatusCode::BAD_REQUEST, "insufficient_balance"),
            ("over daily limit", local(&bob, "550.00"), StatusCode::BAD_REQUEST, "daily_limit_exceeded"),
            ("no swift", international("10.00", None), StatusCode::BAD_REQUEST, "missing_field"),
            ("blank swift", international("10.00", Some("  ")), StatusCode::BAD_REQUEST, "missing_field"),
            ("bad swift", international("10.00", Some("COBA-DE")), StatusCode::BAD_REQUEST, "invalid_field"),
            ("zero amount", local(&bob, "0"), StatusCode::BAD_REQUEST, "invalid_amount"),
        ];

        for (name, command, status, code) in cases {
            let err = f
                .handler
                .execute(f.sender.id, command, &ctx)
                .await
                .unwrap_err();
            assert_eq!(err.status(), status, "{}", name);
            match &err {
                AppError::Domain(e) => assert_eq!(e.code(), code, "{}", name),
                other => panic!("{}: unexpected error {:?}", name, other),
            }
        }

        let sender = f.store.find_customer(f.sender.id).await.unwrap().unwrap();
        let recipient = f.store.find_customer(f.recipient.id).await.unwrap().unwrap();
        assert_eq!(sender.balance, dec!(900.00));
        assert_eq!(recipient.balance, dec!(100.00));
        let (_, total) = f.store.list_transactions(Page::default()).await.unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_daily_limit_counts_amount_without_fee() {
        let f = fixture().await;
        let bob = f.recipient.account_number.as_str().to_string();

        // 100.00 already sent + 500.00 reaches the limit exactly
        let quote = f
            .handler
            .execute(f.sender.id, local(&bob, "500.00"), &OperationContext::new())
            .await
            .unwrap();

        assert_eq!(quote.total_debit, dec!(500.00));
        assert_eq!(quote.recipient_account, f.recipient.account_number.masked());
    }

    #[tokio::test]
    async fn test_international_quote_is_priced_and_masked() {
        let f = fixture().await;

        let quote = f
            .handler
            .execute(
                f.sender.id,
                international("500.00", Some("cobadeffxxx")),
                &OperationContext::new(),
            )
            .await
            .unwrap();

        assert_eq!(quote.fee, dec!(5.00));
        assert_eq!(quote.total_debit, dec!(505.00));
        assert_eq!(quote.recipient_account, "******************3000");
        assert_eq!(quote.swift_code.as_deref(), Some("COBADEFFXXX"));
        assert_eq!(quote.currency, "USD");
    }

    #[test]
    fn test_local_transfers_are_free() {
        assert_eq!(transfer_fee(TransferType::Local, dec!(1234.56)), dec!(0.00));
    }

    #[test]
    fn test_international_fee_minimum() {
        assert_eq!(transfer_fee(TransferType::International, dec!(10.00)), dec!(5.00));
        assert_eq!(transfer_fee(TransferType::International, dec!(500.00)), dec!(5.00));
    }

    #[test]
    fn test_international_fee_percentage_rounds_to_cents() {
        assert_eq!(transfer_fee(TransferType::International, dec!(1000.00)), dec!(10.00));
        assert_eq!(transfer_fee(TransferType::International, dec!(1234.50)), dec!(12.35));
    }

    #[test]
    fn test_reference_shape() {
        let reference = new_reference();
        assert!(reference.starts_with("TRF"));
        assert_eq!(reference.len(), 3 + 14 + 6);
    }

    #[test]
    fn test_quote_becomes_service_unavailable() {
        let quote = TransferQuote {
            reference: "TRF1".to_string(),
            transfer_type: TransferType::Local,
            recipient_account: mask_account("1234567890"),
            recipient_name: "Bob".to_string(),
            recipient_bank: None,
            swift_code: None,
            amount: dec!(10.00),
            fee: dec!(0.00),
            total_debit: dec!(10.00),
            currency: "USD".to_string(),
        };

        match quote.unavailable() {
            AppError::ServiceUnavailable { details, .. } => {
                assert_eq!(details["recipient_account"], "******7890");
                assert_eq!(details["total_debit"], "10.00");
                assert!(details.get("swift_code").is_none());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
