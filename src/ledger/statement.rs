//! Statement Reconstructor
//!
//! Only the current balance is stored, so period balances are derived by
//! walking history backwards from it: transactions after the period give the
//! closing balance, transactions inside it give the opening balance. Entries
//! are then replayed forward to attach a running balance to each one.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    money, AccountNumber, Customer, Direction, DomainError, TransactionKind, TransactionRecord,
};
use crate::error::AppError;
use crate::store::BankStore;

/// Length of the default statement window
pub const DEFAULT_PERIOD_DAYS: i64 = 30;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Statement dates are limited to four-digit years
const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// Inclusive range of calendar days (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatementPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl StatementPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        check_year("startDate", start)?;
        check_year("endDate", end)?;
        if start > end {
            return Err(DomainError::InvalidField {
                field: "startDate",
                reason: "must not be after endDate".to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Resolve optional `YYYY-MM-DD` query values. A missing end defaults to
    /// `today`, a missing start to thirty days before the end.
    pub fn from_query(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, DomainError> {
        let end = match end.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => parse_date("endDate", raw)?,
            None => today,
        };
        let start = match start.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => parse_date("startDate", raw)?,
            None => end
                .checked_sub_signed(Duration::days(DEFAULT_PERIOD_DAYS))
                .ok_or_else(|| out_of_range("startDate"))?,
        };
        Self::new(start, end)
    }

    /// First instant of the period
    pub fn starts_at(&self) -> DateTime<Utc> {
        midnight(self.start)
    }

    /// First instant after the period
    pub fn ends_before(&self) -> DateTime<Utc> {
        self.end
            .succ_opt()
            .map_or(DateTime::<Utc>::MAX_UTC, midnight)
    }

    fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.starts_at() && at < self.ends_before()
    }
}

fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, DomainError> {
    let day = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| DomainError::InvalidField {
        field,
        reason: "expected a date formatted YYYY-MM-DD".to_string(),
    })?;
    check_year(field, day)?;
    Ok(day)
}

fn check_year(field: &'static str, day: NaiveDate) -> Result<(), DomainError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&day.year()) {
        Ok(())
    } else {
        Err(out_of_range(field))
    }
}

fn out_of_range(field: &'static str) -> DomainError {
    DomainError::InvalidField {
        field,
        reason: format!("year must be between {} and {}", MIN_YEAR, MAX_YEAR),
    }
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementEntry {
    pub transaction_id: Uuid,
    pub date: DateTime<Utc>,
    pub kind: TransactionKind,
    pub direction: Direction,
    pub description: Option<String>,
    /// The other party's account number
    pub counterparty_account: AccountNumber,
    pub amount: Decimal,
    pub running_balance: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatementSummary {
    pub credit_count: usize,
    pub total_credits: Decimal,
    pub debit_count: usize,
    pub total_debits: Decimal,
    pub net_change: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub account_number: AccountNumber,
    pub account_name: String,
    pub currency: String,
    pub period: StatementPeriod,
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
    pub entries: Vec<StatementEntry>,
    pub summary: StatementSummary,
}

impl Statement {
    /// Build a statement from the customer's current balance and every
    /// transaction involving them since the period start, oldest first.
    pub fn reconstruct(
        customer: &Customer,
        period: StatementPeriod,
        history: &[TransactionRecord],
    ) -> Self {
        let mut closing = customer.balance;
        let mut in_period = Vec::new();

        for record in history {
            if record.created_at >= period.ends_before() {
                closing -= record.signed_amount_for(customer.id);
            } else if period.contains(record.created_at) {
                in_period.push(record);
            }
        }

        let opening = in_period
            .iter()
            .fold(closing, |balance, record| {
                balance - record.signed_amount_for(customer.id)
            });

        let mut running = opening;
        let mut summary = StatementSummary::default();
        let mut entries = Vec::with_capacity(in_period.len());

        for record in in_period {
            let Some(direction) = record.direction_for(customer.id) else {
                continue;
            };
            let counterparty_account = match direction {
                Direction::Credit => {
                    summary.credit_count += 1;
                    summary.total_credits += record.amount;
                    record.from_account_number.clone()
                }
                Direction::Debit => {
                    summary.debit_count += 1;
                    summary.total_debits += record.amount;
                    record.to_account_number.clone()
                }
            };
            running += record.signed_amount_for(customer.id);

            entries.push(StatementEntry {
                transaction_id: record.id,
                date: record.created_at,
                kind: record.kind,
                direction,
                description: record.description.clone(),
                counterparty_account,
                amount: record.amount,
                running_balance: money(running),
            });
        }

        summary.total_credits = money(summary.total_credits);
        summary.total_debits = money(summary.total_debits);
        summary.net_change = money(summary.total_credits - summary.total_debits);

        Self {
            account_number: customer.account_number.clone(),
            account_name: customer.name.clone(),
            currency: customer.currency.clone(),
            period,
            opening_balance: money(opening),
            closing_balance: money(closing),
            entries,
            summary,
        }
    }

    /// Load history for `customer` and reconstruct the statement.
    pub async fn load(
        store: &dyn BankStore,
        customer: &Customer,
        period: StatementPeriod,
    ) -> Result<Self, AppError> {
        let history = store
            .customer_transactions_since(customer.id, period.starts_at())
            .await?;

        tracing::debug!(
            customer_id = %customer.id,
            start = %period.start,
            end = %period.end,
            transactions = history.len(),
            "Reconstructing statement"
        );

        Ok(Self::reconstruct(customer, period, &history))
    }
}
