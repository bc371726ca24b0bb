//! API Routes
//!
//! Top-level router: the health probe plus the customer and admin surfaces.

use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::middleware::{context_middleware, logging_middleware};
use super::{admin, customer, AppState};

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    // Layers run bottom-up: the request id is assigned before anything logs
    Router::new()
        .route("/health", get(health_check))
        .nest("/customer", customer::router(state.clone()))
        .nest("/admin", admin::router(state.clone()))
        .layer(middleware::from_fn(context_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
