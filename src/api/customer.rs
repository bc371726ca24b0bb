//! Customer-facing routes (`/customer`)

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::{
    validation, CustomerProfile, CustomerTransaction, DomainError, Identity, OperationContext, Page,
    Pagination, Role,
};
use crate::error::{AppError, AppResult};
use crate::handlers::{
    ChangePasswordCommand, ChangePinCommand, CredentialsHandler, CustomerTransferCommand,
    CustomerTransferHandler, RegisterCustomerCommand, RegisterCustomerHandler,
};
use crate::ledger::{Statement, StatementPeriod};

use super::extract::{ApiJson, ApiQuery};
use super::middleware::customer_auth_middleware;
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: &'static str,
    pub token: String,
    pub expires_at: chrono::DateTime<Utc>,
    pub customer: CustomerProfile,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub success: bool,
    pub transactions: Vec<CustomerTransaction>,
    pub pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementFormat {
    Json,
    Pdf,
}

impl StatementFormat {
    fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("json") => Ok(Self::Json),
            Some("pdf") => Ok(Self::Pdf),
            Some(other) => Err(AppError::InvalidRequest(format!(
                "Unsupported statement format '{}'; use json or pdf",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatementResponse {
    pub success: bool,
    pub format: StatementFormat,
    /// Set for `format=pdf`: the document is not rendered server-side
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_available: Option<bool>,
    pub statement: Statement,
}

// =========================================================================
// Router
// =========================================================================

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/profile", get(profile))
        .route("/transactions", get(transactions))
        .route("/statement", get(statement))
        .route("/transfer", post(transfer))
        .route("/change-password", post(change_password))
        .route("/change-pin", post(change_pin))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            customer_auth_middleware,
        ));

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .merge(protected)
}

fn customer_id(identity: &Identity) -> AppResult<uuid::Uuid> {
    match identity.role {
        Role::Customer => Ok(identity.subject),
        Role::Admin => Err(AppError::Unauthorized),
    }
}

// =========================================================================
// Handlers
// =========================================================================

/// POST /customer/auth/register
async fn register(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(command): ApiJson<RegisterCustomerCommand>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let handler = RegisterCustomerHandler::new(
        state.store.clone(),
        state.hasher.clone(),
        state.config.default_currency.clone(),
    );
    let customer = handler.execute(command, false, &context).await?;
    let issued = state.tokens.issue(customer.id, Role::Customer)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "Registration successful",
            token: issued.token,
            expires_at: issued.expires_at,
            customer: customer.profile(),
        }),
    ))
}

/// POST /customer/auth/login
async fn login(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = validation::required("email", request.email.as_deref())?.to_lowercase();
    let password = request
        .password
        .filter(|p| !p.is_empty())
        .ok_or(DomainError::MissingField("password"))?;

    let customer = state
        .store
        .find_customer_by_email(&email)
        .await?
        .filter(|c| !c.is_system);

    // Same response whether the email or the password was wrong
    let customer = match customer {
        Some(c) if state.hasher.verify(&password, &c.password_hash) => c,
        _ => {
            tracing::info!(request_id = %context.request_id(), "Customer login failed");
            return Err(AppError::InvalidCredentials);
        }
    };

    let issued = state.tokens.issue(customer.id, Role::Customer)?;
    tracing::info!(customer_id = %customer.id, "Customer logged in");

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful",
        token: issued.token,
        expires_at: issued.expires_at,
        customer: customer.profile(),
    }))
}

/// GET /customer/profile
async fn profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> AppResult<Json<Value>> {
    let customer = state
        .store
        .find_customer(customer_id(&identity)?)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(json!({
        "success": true,
        "customer": customer.profile(),
    })))
}

/// GET /customer/transactions?page&limit
async fn transactions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<Json<TransactionsResponse>> {
    let id = customer_id(&identity)?;
    let page = Page::new(query.page, query.limit);
    let (records, total) = state.store.customer_transactions(id, page).await?;

    let transactions = records
        .into_iter()
        .filter_map(|record| CustomerTransaction::for_customer(record, id))
        .collect();

    Ok(Json(TransactionsResponse {
        success: true,
        transactions,
        pagination: page.describe(total),
    }))
}

/// GET /customer/statement?startDate&endDate&format
async fn statement(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiQuery(query): ApiQuery<StatementQuery>,
) -> AppResult<Json<StatementResponse>> {
    let format = StatementFormat::parse(query.format.as_deref())?;
    let period = StatementPeriod::from_query(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        Utc::now().date_naive(),
    )?;

    let customer = state
        .store
        .find_customer(customer_id(&identity)?)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let statement = Statement::load(state.store.as_ref(), &customer, period).await?;

    Ok(Json(StatementResponse {
        success: true,
        format,
        pdf_available: (format == StatementFormat::Pdf).then_some(false),
        statement,
    }))
}

/// POST /customer/transfer
///
/// Always ends in an error: validation failures as 4xx, otherwise 503.
async fn transfer(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(context): Extension<OperationContext>,
    ApiJson(command): ApiJson<CustomerTransferCommand>,
) -> AppResult<Json<Value>> {
    let handler = CustomerTransferHandler::new(
        state.store.clone(),
        state.hasher.clone(),
        state.config.daily_transfer_limit,
    );
    let quote = handler
        .execute(customer_id(&identity)?, command, &context)
        .await?;

    Err(quote.unavailable())
}

/// POST /customer/change-password
async fn change_password(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(context): Extension<OperationContext>,
    ApiJson(command): ApiJson<ChangePasswordCommand>,
) -> AppResult<Json<Value>> {
    CredentialsHandler::new(state.store.clone(), state.hasher.clone())
        .change_password(customer_id(&identity)?, command, &context)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password changed successfully",
    })))
}

/// POST /customer/change-pin
async fn change_pin(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(context): Extension<OperationContext>,
    ApiJson(command): ApiJson<ChangePinCommand>,
) -> AppResult<Json<Value>> {
    CredentialsHandler::new(state.store.clone(), state.hasher.clone())
        .change_pin(customer_id(&identity)?, command, &context)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Transaction PIN changed successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_query_uses_camel_case() {
        let query: StatementQuery =
            serde_json::from_value(json!({"startDate": "2024-01-01", "endDate": "2024-01-31"}))
                .unwrap();
        assert_eq!(query.start_date.as_deref(), Some("2024-01-01"));
        assert_eq!(query.end_date.as_deref(), Some("2024-01-31"));
        assert!(query.format.is_none());
    }

    #[test]
    fn test_statement_format() {
        assert_eq!(StatementFormat::parse(None).unwrap(), StatementFormat::Json);
        assert_eq!(StatementFormat::parse(Some("PDF")).unwrap(), StatementFormat::Pdf);
        assert!(StatementFormat::parse(Some("csv")).is_err());
    }
}
