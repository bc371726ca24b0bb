//! API Middleware
//!
//! Request context, customer bearer-token auth, admin session auth and
//! request logging. Both auth middlewares attach the same `Identity`.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

use crate::auth::session::{session_from_cookie_header, SESSION_HEADER};
use crate::auth::{hash_session_token, AuthError};
use crate::domain::{AdminUser, Identity, OperationContext, Role};
use crate::error::AppError;

use super::AppState;

/// The admin session behind the current request
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub token_hash: String,
    pub admin: AdminUser,
    pub expires_at: DateTime<Utc>,
}

// =========================================================================
// Operation context
// =========================================================================

/// Seed an `OperationContext` with the request id and peer address.
pub async fn context_middleware(mut request: Request<Body>, next: Next) -> Response {
    let mut context = OperationContext::new();

    if let Some(id) = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
    {
        context = context.with_request_id(id);
    }
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        context = context.with_client_ip(addr.ip());
    }

    request.extensions_mut().insert(context);
    next.run(request).await
}

fn attach_identity(request: &mut Request<Body>, identity: Identity) {
    let context = request
        .extensions()
        .get::<OperationContext>()
        .cloned()
        .unwrap_or_default()
        .with_actor(identity);
    request.extensions_mut().insert(context);
    request.extensions_mut().insert(identity);
}

// =========================================================================
// Customer bearer tokens
// =========================================================================

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::Missing)?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AuthError::Malformed),
    }
}

/// Verify `Authorization: Bearer <token>` and resolve it to a customer.
pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = state.tokens.verify(bearer_token(request.headers())?)?;
    if claims.role != Role::Customer {
        return Err(AuthError::UnknownSubject.into());
    }

    // Tokens outlive deleted customers; the subject must still exist
    match state.store.find_customer(claims.sub).await? {
        Some(customer) if !customer.is_system => {}
        _ => return Err(AuthError::UnknownSubject.into()),
    }

    attach_identity(&mut request, Identity::customer(claims.sub));
    Ok(next.run(request).await)
}

// =========================================================================
// Admin sessions
// =========================================================================

/// Session token from the `admin_session` cookie or `X-Admin-Session`.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(session_from_cookie_header)
        .or_else(|| {
            headers
                .get(SESSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_string)
}

/// Resolve the server-side admin session.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(request.headers()).ok_or(AuthError::Missing)?;
    let token_hash = hash_session_token(&token);

    let session = state
        .store
        .find_session(&token_hash)
        .await?
        .ok_or(AuthError::UnknownSubject)?;

    if session.is_expired(Utc::now()) {
        state.store.delete_session(&token_hash).await?;
        return Err(AuthError::Expired.into());
    }

    let admin = state
        .store
        .find_admin(session.admin_id)
        .await?
        .ok_or(AuthError::UnknownSubject)?;

    attach_identity(&mut request, Identity::admin(admin.id));
    request.extensions_mut().insert(CurrentSession {
        token_hash,
        admin,
        expires_at: session.expires_at,
    });

    Ok(next.run(request).await)
}

// =========================================================================
// Request logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", SESSION_HEADER];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = mask_headers_for_logging(request.headers());
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = %request_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}
