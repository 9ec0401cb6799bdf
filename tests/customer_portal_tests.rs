mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{token_from_link, uuid, TestApp};

const PASSWORD: &str = "correct-horse";

fn register_payload(email: &str) -> Value {
    json!({
        "email": email,
        "password": PASSWORD,
        "firstName": "Ana",
        "lastName": "Ruiz",
        "phone": "+1 312 555 0199"
    })
}

async fn login(app: &TestApp, email: &str, password: &str) -> common::TestResponse {
    app.post(
        "/api/customer/login",
        json!({ "email": email, "password": password }),
        None,
    )
    .await
}

/// Registro + verificación; devuelve el token de sesión
async fn registered_customer(app: &TestApp, email: &str) -> String {
    let response = app.post("/api/customer/register", register_payload(email), None).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);

    let mail = app.email.sent_to(email).pop().unwrap();
    let response = app
        .post(
            "/api/customer/verify-email",
            json!({ "token": token_from_link(&mail.body) }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);

    let response = login(app, email, PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    response.body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_register_verify_and_login() {
    let app = TestApp::new().await;

    let response = app
        .post("/api/customer/register", register_payload("Ana@Example.com"), None)
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["customer"]["email"], "ana@example.com");
    assert_eq!(response.body["customer"]["emailVerified"], false);
    assert!(response.body["customer"].get("passwordHash").is_none());
    assert_eq!(response.body["notifications"]["verificationEmail"]["sent"], true);

    // Sin verificar no hay sesión
    let response = login(&app, "ana@example.com", PASSWORD).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "Email address is not verified");

    let mail = app.email.sent_to("ana@example.com").pop().unwrap();
    let token = token_from_link(&mail.body);
    assert_eq!(token.len(), 43);

    let response = app
        .post("/api/customer/verify-email", json!({ "token": token }), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["emailVerified"], true);

    // El token de verificación es de un solo uso
    let response = app
        .post("/api/customer/verify-email", json!({ "token": token }), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = login(&app, "ana@example.com", PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);
    let cookie = response.cookie("customer-token").unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=604800"));

    let session = response.body["token"].as_str().unwrap();
    let response = app.get("/api/customer/me", Some(session)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!response.body["data"]["lastLoginAt"].is_null());
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let app = TestApp::new().await;
    registered_customer(&app, "ana@example.com").await;

    let response = app
        .post("/api/customer/register", register_payload("ANA@example.com"), None)
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let mut short = register_payload("bob@example.com");
    short["password"] = json!("short");
    let response = app.post("/api/customer/register", short, None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let mut missing = register_payload("bob@example.com");
    missing.as_object_mut().unwrap().remove("lastName");
    let response = app.post("/api/customer/register", missing, None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Missing required field: lastName");
}

#[tokio::test]
async fn test_login_failures() {
    let app = TestApp::new().await;
    registered_customer(&app, "ana@example.com").await;

    let response = login(&app, "ana@example.com", "wrong-password").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "Invalid email or password");

    let response = login(&app, "nobody@example.com", PASSWORD).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_disabled_account_is_locked_out() {
    let app = TestApp::new().await;
    let token = registered_customer(&app, "ana@example.com").await;
    let me = app.get("/api/customer/me", Some(&token)).await;
    let id = uuid(&me.body["data"]["id"]);

    assert!(app.store.set_customer_active(id, false).await);

    let response = login(&app, "ana@example.com", PASSWORD).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "Account is disabled");

    // La sesión ya emitida deja de valer
    let response = app.get("/api/customer/me", Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = TestApp::new().await;
    registered_customer(&app, "ana@example.com").await;

    let response = app
        .post("/api/customer/forgot-password", json!({ "email": "ghost@example.com" }), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(app.email.sent_to("ghost@example.com").is_empty());

    let response = app
        .post("/api/customer/forgot-password", json!({ "email": "ana@example.com" }), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let mail = app.email.sent_to("ana@example.com").pop().unwrap();
    assert!(mail.body.contains("reset-password?token="));
    let token = token_from_link(&mail.body);

    let response = app
        .post(
            "/api/customer/reset-password",
            json!({ "token": token, "password": "brand-new-pass" }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .post(
            "/api/customer/reset-password",
            json!({ "token": token, "password": "another-pass-1" }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Reset token is invalid or expired");

    assert_eq!(login(&app, "ana@example.com", PASSWORD).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(login(&app, "ana@example.com", "brand-new-pass").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_profile_update() {
    let app = TestApp::new().await;
    let token = registered_customer(&app, "ana@example.com").await;

    let response = app
        .patch("/api/customer/me", json!({ "firstName": "Anabel" }), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["firstName"], "Anabel");
    assert_eq!(response.body["data"]["lastName"], "Ruiz");

    let response = app
        .patch("/api/customer/me", json!({ "phone": "call me" }), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_portal_only_shows_own_records() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    // Cotización previa al registro: se vincula al registrarse
    app.submit_quote("ana@example.com").await;
    let ana = registered_customer(&app, "ana@example.com").await;
    let bob = registered_customer(&app, "bob@example.com").await;

    let ana_booking = app.booking_with_customer(&admin, "ana@example.com").await;
    let bob_booking = app.booking_with_customer(&admin, "bob@example.com").await;
    app.post(
        &format!("/api/admin/bookings/{}/create-invoice", ana_booking["id"].as_str().unwrap()),
        json!({ "subtotal": "500.00", "tax": "0" }),
        Some(&admin),
    )
    .await;

    let response = app.get("/api/customer/quotes", Some(&ana)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 2);

    let response = app.get("/api/customer/bookings", Some(&ana)).await;
    let bookings = response.body["data"].as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["id"], ana_booking["id"]);

    let response = app.get("/api/customer/invoices", Some(&ana)).await;
    assert_eq!(response.body["data"].as_array().unwrap().len(), 1);
    let response = app.get("/api/customer/invoices", Some(&bob)).await;
    assert!(response.body["data"].as_array().unwrap().is_empty());

    let own = format!("/api/customer/bookings/{}", ana_booking["id"].as_str().unwrap());
    let response = app.get(&own, Some(&ana)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["invoices"].as_array().unwrap().len(), 1);

    let foreign = format!("/api/customer/bookings/{}", bob_booking["id"].as_str().unwrap());
    let response = app.get(&foreign, Some(&ana)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_portal_requires_session() {
    let app = TestApp::new().await;

    let response = app.get("/api/customer/bookings", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "Authentication required");

    // Un token de administrador no abre el portal
    let admin = app.admin_token().await;
    let response = app.get("/api/customer/me", Some(&admin)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.post("/api/customer/logout", json!({}), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.cookie("customer-token").unwrap().contains("Max-Age=0"));
}
