//! Admin API integration tests (in-memory store)

use axum::http::{header, Method, StatusCode};
use bankdesk::store::BankStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

mod common;

use common::{registration, test_app, ADMIN_PASSWORD, ADMIN_USERNAME};

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = test_app().await;
    let reply = app
        .post(
            "/admin/auth/login",
            json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
            &[],
        )
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["admin"]["username"], ADMIN_USERNAME);
    assert!(reply.body["admin"].get("password_hash").is_none());

    let token = reply.body["session_token"].as_str().unwrap();
    let cookie = reply.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with(&format!("admin_session={}", token)));
    assert!(cookie.contains("HttpOnly"));

    // The cookie alone authenticates
    let reply = app
        .get(
            "/admin/auth/me",
            &[("cookie", &format!("admin_session={}", token))],
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["admin"]["username"], ADMIN_USERNAME);
}

#[tokio::test]
async fn test_bad_login_is_generic() {
    let app = test_app().await;
    let wrong_password = app
        .post(
            "/admin/auth/login",
            json!({ "username": ADMIN_USERNAME, "password": "wrong-password" }),
            &[],
        )
        .await;
    let unknown_user = app
        .post(
            "/admin/auth/login",
            json!({ "username": "ghost", "password": ADMIN_PASSWORD }),
            &[],
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body["error_code"], "invalid_credentials");
    assert_eq!(wrong_password.body, unknown_user.body);
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = test_app().await;
    for uri in ["/admin/customers", "/admin/dashboard/stats", "/admin/settings/site"] {
        let reply = app.get(uri, &[]).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED, "{}", uri);

        let reply = app.get(uri, &[("x-admin-session", "not-a-session")]).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED, "{}", uri);
    }

    // A customer token is not an admin session
    let (token, _) = app.register_customer("ada@example.com").await;
    let reply = app
        .get("/admin/customers", &[("authorization", &format!("Bearer {}", token))])
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = test_app().await;
    let session = app.admin_session().await;
    let auth = [("x-admin-session", session.as_str())];

    let reply = app.request(Method::POST, "/admin/auth/logout", None, &auth).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.headers[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    let reply = app.get("/admin/auth/me", &auth).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deposit_accumulates_and_records() {
    let app = test_app().await;
    let (_, customer) = app.register_customer("ada@example.com").await;
    let account = customer["account_number"].as_str().unwrap();
    let session = app.admin_session().await;

    let first = app.deposit(&session, account, "100.00").await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(decimal(&first.body["new_balance"]), dec!(100.00));

    let second = app.deposit(&session, account, "50").await;
    assert_eq!(decimal(&second.body["new_balance"]), dec!(150.00));
    assert_eq!(second.body["transaction"]["kind"], "deposit");
    assert_eq!(second.body["transaction"]["from_account_number"], "0000000000");

    let reply = app
        .get("/admin/transactions", &[("x-admin-session", &session)])
        .await;
    assert_eq!(reply.body["pagination"]["total"], 2);
}

#[tokio::test]
async fn test_deposit_validation() {
    let app = test_app().await;
    let (_, customer) = app.register_customer("ada@example.com").await;
    let account = customer["account_number"].as_str().unwrap();
    let session = app.admin_session().await;

    for amount in ["0", "-5", "1.005", "abc"] {
        let reply = app.deposit(&session, account, amount).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", amount);
        assert_eq!(reply.body["error_code"], "invalid_amount", "{}", amount);
    }

    let reply = app.deposit(&session, "1999999999", "10").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = app.deposit(&session, "0000000000", "10").await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_book_transfer_moves_funds_and_blocks_overdraft() {
    let app = test_app().await;
    let (_, ada) = app.register_customer("ada@example.com").await;
    let (_, bob) = app.register_customer("bob@example.com").await;
    let session = app.admin_session().await;
    let auth = [("x-admin-session", session.as_str())];
    app.deposit(&session, ada["account_number"].as_str().unwrap(), "200.00")
        .await;

    let transfer = |amount: &str| {
        json!({
            "from_account_number": ada["account_number"],
            "to_account_number": bob["account_number"],
            "amount": amount,
            "description": "rent",
        })
    };

    let reply = app.post("/admin/transfers", transfer("75.50"), &auth).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(decimal(&reply.body["from_balance"]), dec!(124.50));
    assert_eq!(decimal(&reply.body["to_balance"]), dec!(75.50));

    let reply = app.post("/admin/transfers", transfer("500.00"), &auth).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error_code"], "insufficient_balance");

    let same = json!({
        "from_account_number": ada["account_number"],
        "to_account_number": ada["account_number"],
        "amount": "1.00",
    });
    let reply = app.post("/admin/transfers", same, &auth).await;
    assert_eq!(reply.body["error_code"], "self_transfer");

    // Balances unchanged by the failed attempts
    let ada_id = ada["id"].as_str().unwrap();
    let reply = app.get(&format!("/admin/customers/{}", ada_id), &auth).await;
    assert_eq!(decimal(&reply.body["customer"]["balance"]), dec!(124.50));
}

#[tokio::test]
async fn test_customer_crud() {
    let app = test_app().await;
    let session = app.admin_session().await;
    let auth = [("x-admin-session", session.as_str())];

    let mut body = registration("grace@example.com");
    body["name"] = json!("Grace Hopper");
    body["currency"] = json!("eur");
    let reply = app.post("/admin/customers", body, &auth).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["customer"]["currency"], "EUR");
    let id = reply.body["customer"]["id"].as_str().unwrap().to_string();
    let uri = format!("/admin/customers/{}", id);

    app.register_customer("ada@example.com").await;

    let reply = app.get("/admin/customers?search=grace", &auth).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["pagination"]["total"], 1);
    assert_eq!(reply.body["customers"][0]["name"], "Grace Hopper");

    let reply = app.get("/admin/customers", &auth).await;
    assert_eq!(reply.body["pagination"]["total"], 2);

    let reply = app
        .request(
            Method::PUT,
            &uri,
            Some(json!({ "city": "New York", "phone": "+1 555 0100" })),
            &auth,
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["customer"]["city"], "New York");
    assert_eq!(reply.body["customer"]["name"], "Grace Hopper");

    let reply = app
        .request(Method::PUT, &uri, Some(json!({ "email": "ada@example.com" })), &auth)
        .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    let reply = app.request(Method::DELETE, &uri, None, &auth).await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = app.get(&uri, &auth).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = app.get("/admin/customers/not-a-uuid", &auth).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_system_account_is_protected() {
    let app = test_app().await;
    let session = app.admin_session().await;
    let auth = [("x-admin-session", session.as_str())];
    let system = app.store.system_account().await.unwrap();
    let uri = format!("/admin/customers/{}", system.id);

    let reply = app
        .request(Method::PUT, &uri, Some(json!({ "name": "Mine now" })), &auth)
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = app.request(Method::DELETE, &uri, None, &auth).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    // Not listed either
    let reply = app.get("/admin/customers", &auth).await;
    assert_eq!(reply.body["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_dashboard_stats() {
    let app = test_app().await;
    let session = app.admin_session().await;
    let (_, ada) = app.register_customer("ada@example.com").await;
    app.register_customer("bob@example.com").await;
    app.deposit(&session, ada["account_number"].as_str().unwrap(), "300.00")
        .await;

    let reply = app
        .get("/admin/dashboard/stats", &[("x-admin-session", &session)])
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let stats = &reply.body["stats"];
    assert_eq!(stats["total_customers"], 2);
    assert_eq!(decimal(&stats["total_balance"]), dec!(300.00));
    assert_eq!(stats["total_deposits"], 1);
    assert_eq!(decimal(&stats["total_deposit_amount"]), dec!(300.00));
    assert_eq!(stats["transactions_today"], 1);
    assert_eq!(stats["recent_transactions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_site_settings_created_lazily_and_updated() {
    let app = test_app().await;
    let session = app.admin_session().await;
    let auth = [("x-admin-session", session.as_str())];

    let reply = app.get("/admin/settings/site", &auth).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["settings"]["site_name"], "Bankdesk");

    let reply = app
        .request(
            Method::PUT,
            "/admin/settings/site",
            Some(json!({ "contact_email": "Help@Bank.test", "city": "Zurich" })),
            &auth,
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["settings"]["contact_email"], "help@bank.test");
    assert_eq!(reply.body["settings"]["site_name"], "Bankdesk");

    let reply = app
        .request(
            Method::PUT,
            "/admin/settings/site",
            Some(json!({ "contact_email": "not-an-email" })),
            &auth,
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = app.get("/admin/settings/site", &auth).await;
    assert_eq!(reply.body["settings"]["city"], "Zurich");
}
