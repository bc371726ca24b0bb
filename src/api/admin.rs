//! Admin portal routes (`/admin`)

use axum::{
    extract::{Extension, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::session::{clear_session_cookie, session_cookie};
use crate::auth::{hash_session_token, new_session_token};
use crate::domain::{
    validation, AdminProfile, AdminSession, CustomerFilter, CustomerProfile, DomainError,
    OperationContext, Page, Pagination, SiteSettingsChanges, TransactionRecord,
};
use crate::error::{AppError, AppResult};
use crate::handlers::{
    BookTransferCommand, BookTransferHandler, DeleteCustomerHandler, DepositCommand,
    DepositHandler, RegisterCustomerCommand, RegisterCustomerHandler, UpdateCustomerCommand,
    UpdateCustomerHandler,
};
use crate::store::DashboardTotals;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::middleware::{admin_auth_middleware, CurrentSession};
use super::AppState;

/// Transactions shown on the dashboard
const RECENT_TRANSACTIONS: u32 = 5;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminLoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerListResponse {
    pub success: bool,
    pub customers: Vec<CustomerProfile>,
    pub pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub success: bool,
    pub transactions: Vec<TransactionRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    #[serde(flatten)]
    pub totals: DashboardTotals,
    pub recent_transactions: Vec<TransactionRecord>,
}

// =========================================================================
// Router
// =========================================================================

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/deposit", post(deposit))
        .route("/transfers", post(book_transfer))
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/transactions", get(list_transactions))
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/settings/site", get(get_site_settings).put(update_site_settings))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            admin_auth_middleware,
        ));

    Router::new()
        .route("/auth/login", post(login))
        .merge(protected)
}

fn set_cookie(value: String) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&value)
        .map_err(|e| AppError::Internal(format!("invalid cookie header: {}", e)))?;
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

// =========================================================================
// Authentication
// =========================================================================

/// POST /admin/auth/login
async fn login(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<AdminLoginRequest>,
) -> AppResult<(HeaderMap, Json<Value>)> {
    let username = validation::required("username", request.username.as_deref())?;
    let password = request
        .password
        .filter(|p| !p.is_empty())
        .ok_or(DomainError::MissingField("password"))?;

    let admin = match state.store.find_admin_by_username(&username).await? {
        Some(admin) if state.hasher.verify(&password, &admin.password_hash) => admin,
        _ => {
            tracing::warn!(
                username = %username,
                request_id = %context.request_id(),
                "Admin login failed"
            );
            return Err(AppError::InvalidCredentials);
        }
    };

    let token = new_session_token();
    let now = Utc::now();
    let ttl = Duration::hours(state.config.admin_session_ttl_hours);
    let session = AdminSession {
        token_hash: hash_session_token(&token),
        admin_id: admin.id,
        created_at: now,
        expires_at: now + ttl,
    };
    state.store.insert_session(&session).await?;

    tracing::info!(admin_id = %admin.id, "Admin logged in");

    let headers = set_cookie(session_cookie(
        &token,
        ttl.num_seconds(),
        state.config.is_production(),
    ))?;

    Ok((
        headers,
        Json(json!({
            "success": true,
            "message": "Login successful",
            "admin": AdminProfile::from(&admin),
            "session_token": token,
            "expires_at": session.expires_at,
        })),
    ))
}

/// POST /admin/auth/logout
async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> AppResult<(HeaderMap, Json<Value>)> {
    state.store.delete_session(&session.token_hash).await?;
    tracing::info!(admin_id = %session.admin.id, "Admin logged out");

    Ok((
        set_cookie(clear_session_cookie())?,
        Json(json!({ "success": true, "message": "Logged out" })),
    ))
}

/// GET /admin/auth/me
async fn me(Extension(session): Extension<CurrentSession>) -> Json<Value> {
    Json(json!({
        "success": true,
        "admin": AdminProfile::from(&session.admin),
        "expires_at": session.expires_at,
    }))
}

// =========================================================================
// Money movement
// =========================================================================

/// POST /admin/deposit
async fn deposit(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(command): ApiJson<DepositCommand>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let result = DepositHandler::new(state.store.clone())
        .execute(command, &context)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Deposit successful",
            "transaction": result.transaction,
            "new_balance": result.new_balance,
        })),
    ))
}

/// POST /admin/transfers
async fn book_transfer(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(command): ApiJson<BookTransferCommand>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let result = BookTransferHandler::new(state.store.clone())
        .execute(command, &context)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Transfer completed",
            "transaction": result.transaction,
            "from_balance": result.from_balance,
            "to_balance": result.to_balance,
        })),
    ))
}

// =========================================================================
// Customers
// =========================================================================

/// GET /admin/customers?page&limit&search
async fn list_customers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CustomerListQuery>,
) -> AppResult<Json<CustomerListResponse>> {
    let page = Page::new(query.page, query.limit);
    let filter = CustomerFilter {
        search: validation::optional(query.search.as_deref()),
    };
    let (customers, total) = state.store.list_customers(&filter, page).await?;

    Ok(Json(CustomerListResponse {
        success: true,
        customers: customers.iter().map(|c| c.profile()).collect(),
        pagination: page.describe(total),
    }))
}

/// POST /admin/customers
async fn create_customer(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(command): ApiJson<RegisterCustomerCommand>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let customer = RegisterCustomerHandler::new(
        state.store.clone(),
        state.hasher.clone(),
        state.config.default_currency.clone(),
    )
    .execute(command, true, &context)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Customer created",
            "customer": customer.profile(),
        })),
    ))
}

/// GET /admin/customers/:id
async fn get_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let customer = state
        .store
        .find_customer(id)
        .await?
        .filter(|c| !c.is_system)
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "customer": customer.profile(),
    })))
}

/// PUT /admin/customers/:id
async fn update_customer(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(command): ApiJson<UpdateCustomerCommand>,
) -> AppResult<Json<Value>> {
    let customer = UpdateCustomerHandler::new(state.store.clone(), state.hasher.clone())
        .execute(id, command, &context)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Customer updated",
        "customer": customer.profile(),
    })))
}

/// DELETE /admin/customers/:id
async fn delete_customer(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    DeleteCustomerHandler::new(state.store.clone())
        .execute(id, &context)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Customer deleted",
    })))
}

// =========================================================================
// Reporting
// =========================================================================

/// GET /admin/transactions?page&limit
async fn list_transactions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TransactionListQuery>,
) -> AppResult<Json<TransactionListResponse>> {
    let page = Page::new(query.page, query.limit);
    let (transactions, total) = state.store.list_transactions(page).await?;

    Ok(Json(TransactionListResponse {
        success: true,
        transactions,
        pagination: page.describe(total),
    }))
}

/// GET /admin/dashboard/stats
async fn dashboard_stats(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let today = Utc::now().date_naive();
    let day_start = Utc.from_utc_datetime(&today.and_time(chrono::NaiveTime::MIN));

    let totals = state.store.dashboard_totals(day_start).await?;
    let (recent_transactions, _) = state
        .store
        .list_transactions(Page::new(Some(1), Some(RECENT_TRANSACTIONS)))
        .await?;

    let stats = DashboardStats {
        totals,
        recent_transactions,
    };

    Ok(Json(json!({ "success": true, "stats": stats })))
}

// =========================================================================
// Site settings
// =========================================================================

/// GET /admin/settings/site
async fn get_site_settings(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let settings = state.store.site_settings().await?;
    Ok(Json(json!({ "success": true, "settings": settings })))
}

/// PUT /admin/settings/site
async fn update_site_settings(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(changes): ApiJson<SiteSettingsChanges>,
) -> AppResult<Json<Value>> {
    if let Some(email) = changes.contact_email.as_deref().filter(|e| !e.trim().is_empty()) {
        validation::email(email)?;
    }

    let changes = SiteSettingsChanges {
        site_name: changes.site_name.map(|v| v.trim().to_string()),
        contact_email: changes.contact_email.map(|v| v.trim().to_lowercase()),
        contact_phone: changes.contact_phone.map(|v| v.trim().to_string()),
        address: changes.address.map(|v| v.trim().to_string()),
        city: changes.city.map(|v| v.trim().to_string()),
        country: changes.country.map(|v| v.trim().to_string()),
    };
    if changes.site_name.as_deref() == Some("") {
        return Err(DomainError::MissingField("site_name").into());
    }

    let settings = state.store.update_site_settings(&changes).await?;
    tracing::info!(
        actor = %context.actor_label(),
        request_id = %context.request_id(),
        "Site settings updated"
    );

    Ok(Json(json!({
        "success": true,
        "message": "Settings updated",
        "settings": settings,
    })))
}
