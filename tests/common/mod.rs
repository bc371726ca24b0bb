//! Common test utilities
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use bankdesk::api::{self, AppState};
use bankdesk::auth::SecretHasher;
use bankdesk::store::MemoryStore;
use bankdesk::Config;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

pub const ADMIN_USERNAME: &str = "operator";
pub const ADMIN_PASSWORD: &str = "operator-password";
pub const CUSTOMER_PASSWORD: &str = "correct horse battery";
pub const CUSTOMER_PIN: &str = "4321";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Application wired to an in-memory store and cheap Argon2 costs
pub async fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let hasher = SecretHasher::with_costs(1024, 1, 1).unwrap();
    let config = Config {
        admin_username: Some(ADMIN_USERNAME.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        ..Config::default()
    };

    let state = AppState::new(store.clone(), config).with_hasher(hasher);
    bankdesk::db::ensure_bootstrap_admin(store.as_ref(), &state.hasher, &state.config)
        .await
        .unwrap();

    TestApp {
        router: api::create_router(state.clone()),
        state,
        store,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Reply {
            status,
            headers,
            body,
        }
    }

    pub async fn post(&self, uri: &str, body: Value, headers: &[(&str, &str)]) -> Reply {
        self.request(Method::POST, uri, Some(body), headers).await
    }

    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> Reply {
        self.request(Method::GET, uri, None, headers).await
    }

    /// Self-register a customer; returns (bearer token, profile)
    pub async fn register_customer(&self, email: &str) -> (String, Value) {
        let reply = self
            .post("/customer/auth/register", registration(email), &[])
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);

        let token = reply.body["token"].as_str().unwrap().to_string();
        (token, reply.body["customer"].clone())
    }

    /// Log the bootstrap admin in; returns the session token
    pub async fn admin_session(&self) -> String {
        let reply = self
            .post(
                "/admin/auth/login",
                json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
                &[],
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        reply.body["session_token"].as_str().unwrap().to_string()
    }

    /// Credit `account_number` through the admin deposit endpoint
    pub async fn deposit(&self, session: &str, account_number: &str, amount: &str) -> Reply {
        self.post(
            "/admin/deposit",
            json!({ "account_number": account_number, "amount": amount }),
            &[("x-admin-session", session)],
        )
        .await
    }
}

pub fn registration(email: &str) -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": email,
        "password": CUSTOMER_PASSWORD,
        "address": "12 St James's Square",
        "city": "London",
        "country": "GB",
        "transaction_pin": CUSTOMER_PIN,
    })
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
