mod common;

use axum::http::StatusCode;
use rand::Rng;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use common::{dec, uuid, TestApp};
use limo_booking::models::{InvoiceTotals, NewInvoice, PaymentStatus};

fn promo_payload(code: &str) -> Value {
    json!({
        "code": code,
        "description": "Summer weddings",
        "discountType": "PERCENTAGE",
        "discountValue": "10",
        "validFrom": "2024-01-01",
        "validUntil": "2099-12-31T23:59:59Z"
    })
}

async fn create_promo(app: &TestApp, token: &str, payload: Value) -> Value {
    let response = app.post("/api/admin/promo-codes", payload, Some(token)).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    response.body["data"].clone()
}

fn invoice_uri(booking: &Value) -> String {
    format!(
        "/api/admin/bookings/{}/create-invoice",
        booking["id"].as_str().unwrap()
    )
}

#[tokio::test]
async fn test_promo_code_format() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    for code in ["summer10", "SUMMER-10", "SUMMER 10", "PROMO!"] {
        let response = app
            .post("/api/admin/promo-codes", promo_payload(code), Some(&token))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", code);
    }

    let promo = create_promo(&app, &token, promo_payload("  SUMMER10 ")).await;
    assert_eq!(promo["code"], "SUMMER10");
    assert_eq!(promo["usageCount"], 0);
    assert_eq!(promo["isActive"], true);
}

#[tokio::test]
async fn test_promo_code_required_fields() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    for field in ["code", "discountType", "discountValue", "validFrom", "validUntil"] {
        let mut payload = promo_payload("SPRING5");
        payload.as_object_mut().unwrap().remove(field);
        let response = app.post("/api/admin/promo-codes", payload, Some(&token)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", field);
        assert!(response.body["error"].as_str().unwrap().contains(field));
    }

    let mut too_much = promo_payload("SPRING5");
    too_much["discountValue"] = json!("150");
    let response = app.post("/api/admin/promo-codes", too_much, Some(&token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let mut zero_limit = promo_payload("SPRING5");
    zero_limit["usageLimit"] = json!(0);
    let response = app.post("/api/admin/promo-codes", zero_limit, Some(&token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_promo_code_window_must_be_ordered() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let mut inverted = promo_payload("WINDOW1");
    inverted["validFrom"] = json!("2025-06-01");
    inverted["validUntil"] = json!("2025-05-01");
    let response = app.post("/api/admin/promo-codes", inverted, Some(&token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let mut equal = promo_payload("WINDOW1");
    equal["validFrom"] = json!("2025-06-01T00:00:00Z");
    equal["validUntil"] = json!("2025-06-01T00:00:00Z");
    let response = app.post("/api/admin/promo-codes", equal, Some(&token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // En la actualización se valida contra el extremo guardado
    let promo = create_promo(&app, &token, promo_payload("WINDOW1")).await;
    let uri = format!("/api/admin/promo-codes/{}", promo["id"].as_str().unwrap());

    let response = app
        .patch(&uri, json!({ "validUntil": "2023-12-31" }), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .patch(&uri, json!({ "validFrom": "2100-01-01" }), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .patch(&uri, json!({ "validUntil": "2030-01-01" }), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.patch(&uri, json!({ "code": "OTHER1" }), Some(&token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_promo_code_conflicts() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    create_promo(&app, &token, promo_payload("VIP20")).await;

    let response = app
        .post("/api/admin/promo-codes", promo_payload("VIP20"), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_promo_validation_endpoint() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let mut payload = promo_payload("TENOFF");
    payload["maxDiscount"] = json!("30.00");
    create_promo(&app, &token, payload).await;

    let response = app
        .post("/api/promo-codes/validate", json!({ "code": "tenoff", "amount": "250.00" }), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["valid"], true);
    assert_eq!(dec(&response.body["discount"]), Decimal::new(2500, 2));

    let response = app
        .post("/api/promo-codes/validate", json!({ "code": "TENOFF", "amount": "900.00" }), None)
        .await;
    assert_eq!(dec(&response.body["discount"]), Decimal::new(3000, 2));

    let response = app
        .post("/api/promo-codes/validate", json!({ "code": "NOPE", "amount": "10.00" }), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["valid"], false);
    assert_eq!(response.body["reason"], "Promo code not found");

    let mut expired = promo_payload("OLD5");
    expired["validFrom"] = json!("2020-01-01");
    expired["validUntil"] = json!("2020-12-31");
    create_promo(&app, &token, expired).await;
    let response = app
        .post("/api/promo-codes/validate", json!({ "code": "OLD5", "amount": "10.00" }), None)
        .await;
    assert_eq!(response.body["valid"], false);
    assert_eq!(response.body["reason"], "Promo code has expired");
}

#[tokio::test]
async fn test_invoice_requires_customer_account() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let booking = app.booking_without_customer(&token, "ana@example.com").await;

    let response = app
        .post(&invoice_uri(&booking), json!({ "subtotal": "300.00", "tax": "0" }), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Booking has no customer account");
    assert_eq!(app.store.invoice_count().await, 0);
}

#[tokio::test]
async fn test_invoice_rejects_out_of_range_amounts() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let booking = app.booking_with_customer(&token, "ana@example.com").await;

    let response = app
        .post(
            &invoice_uri(&booking),
            json!({ "subtotal": "79228162514264337593543950335", "tax": "1" }),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "BAD_REQUEST");
    assert!(response.body["error"].as_str().unwrap().contains("subtotal"));

    // Cada importe cabe pero la suma no
    let response = app
        .post(
            &invoice_uri(&booking),
            json!({ "subtotal": "99999999.99", "tax": "500.00" }),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Invoice total is out of range");
    assert_eq!(app.store.invoice_count().await, 0);

    let response = app
        .post(
            "/api/promo-codes/validate",
            json!({ "code": "ANY", "amount": "100000000.00" }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invoice_requires_explicit_tax() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let booking = app.booking_with_customer(&token, "ana@example.com").await;

    let response = app
        .post(&invoice_uri(&booking), json!({ "subtotal": "500.00" }), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("tax"));

    let response = app
        .post(&invoice_uri(&booking), json!({ "subtotal": "500.00", "tax": "0" }), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(dec(&response.body["data"]["total"]), Decimal::new(50000, 2));
    assert_eq!(response.body["data"]["paymentStatus"], "PENDING");
    assert_eq!(response.body["data"]["customerId"], booking["customerId"]);
}

#[tokio::test]
async fn test_invoice_total_with_promo() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    create_promo(&app, &token, promo_payload("WEDDING10")).await;
    let booking = app.booking_with_customer(&token, "ana@example.com").await;

    let response = app
        .post(
            &invoice_uri(&booking),
            json!({ "subtotal": "500.00", "tax": "36.13", "promoCode": "wedding10" }),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    let invoice = &response.body["data"];
    assert_eq!(dec(&invoice["promoDiscount"]), Decimal::new(5000, 2));
    assert_eq!(dec(&invoice["total"]), Decimal::new(48613, 2));
    assert!(invoice["invoiceNumber"].as_str().unwrap().starts_with("INV"));

    let response = app.get("/api/admin/promo-codes", Some(&token)).await;
    assert_eq!(response.body["data"][0]["usageCount"], 1);

    // El detalle de la reserva incluye la factura
    let response = app
        .get(&format!("/api/admin/bookings/{}", booking["id"].as_str().unwrap()), Some(&token))
        .await;
    assert_eq!(response.body["data"]["invoices"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invoice_totals_over_random_amounts() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let mut fixed = promo_payload("FLAT25");
    fixed["discountType"] = json!("FIXED");
    fixed["discountValue"] = json!("25.00");
    create_promo(&app, &token, fixed).await;
    let booking = app.booking_with_customer(&token, "ana@example.com").await;

    let mut rng = rand::thread_rng();
    for _ in 0..25 {
        let subtotal = Decimal::new(rng.gen_range(2_500..5_000_000), 2);
        let tax = Decimal::new(rng.gen_range(0..500_000), 2);

        let response = app
            .post(
                &invoice_uri(&booking),
                json!({
                    "subtotal": subtotal.to_string(),
                    "tax": tax.to_string(),
                    "promoCode": "FLAT25"
                }),
                Some(&token),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        let discount = Decimal::new(2500, 2);
        assert_eq!(dec(&response.body["data"]["total"]), subtotal - discount + tax);
    }
}

#[tokio::test]
async fn test_promo_usage_limit_is_enforced() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let mut payload = promo_payload("ONCE");
    payload["usageLimit"] = json!(1);
    let promo = create_promo(&app, &token, payload).await;
    let booking = app.booking_with_customer(&token, "ana@example.com").await;
    let body = json!({ "subtotal": "100.00", "tax": "8.00", "promoCode": "ONCE" });

    let first = app.post(&invoice_uri(&booking), body.clone(), Some(&token)).await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app.post(&invoice_uri(&booking), body, Some(&token)).await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(second.body["error"], "Promo code has reached its usage limit");
    assert_eq!(app.store.invoice_count().await, 1);

    // Canje concurrente: el repositorio rechaza el incremento sin guardar la factura
    let result = app
        .state
        .repos
        .invoices
        .create(NewInvoice {
            booking_id: uuid(&booking["id"]),
            customer_id: uuid(&booking["customerId"]),
            promo_code_id: Some(uuid(&promo["id"])),
            totals: InvoiceTotals::compute(Decimal::new(10000, 2), Decimal::new(1000, 2), Decimal::ZERO)
                .unwrap(),
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            due_date: None,
            paid_at: None,
            notes: None,
        })
        .await;
    let error = result.unwrap_err();
    assert_eq!(error.status_code(), StatusCode::CONFLICT);
    assert_eq!(app.store.invoice_count().await, 1);

    let response = app
        .get(&format!("/api/admin/promo-codes/{}", promo["id"].as_str().unwrap()), Some(&token))
        .await;
    assert_eq!(response.body["data"]["usageCount"], 1);

    // No se puede bajar el límite por debajo del uso
    let mut roomy = promo_payload("THRICE");
    roomy["usageLimit"] = json!(3);
    let other = create_promo(&app, &token, roomy).await;
    for _ in 0..2 {
        let response = app
            .post(
                &invoice_uri(&booking),
                json!({ "subtotal": "100.00", "tax": "0", "promoCode": "THRICE" }),
                Some(&token),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }
    let uri = format!("/api/admin/promo-codes/{}", other["id"].as_str().unwrap());
    let response = app.patch(&uri, json!({ "usageLimit": 1 }), Some(&token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let response = app.patch(&uri, json!({ "usageLimit": 2 }), Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_or_inactive_promo_is_rejected() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let mut inactive = promo_payload("PAUSED");
    inactive["isActive"] = json!(false);
    create_promo(&app, &token, inactive).await;
    let booking = app.booking_with_customer(&token, "ana@example.com").await;

    let response = app
        .post(
            &invoice_uri(&booking),
            json!({ "subtotal": "100.00", "tax": "0", "promoCode": "GHOST" }),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post(
            &invoice_uri(&booking),
            json!({ "subtotal": "100.00", "tax": "0", "promoCode": "PAUSED" }),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Promo code is not active");
    assert_eq!(app.store.invoice_count().await, 0);
}

#[tokio::test]
async fn test_promo_referenced_by_invoice_cannot_be_deleted() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let used = create_promo(&app, &token, promo_payload("USED10")).await;
    let unused = create_promo(&app, &token, promo_payload("FRESH10")).await;
    let booking = app.booking_with_customer(&token, "ana@example.com").await;

    app.post(
        &invoice_uri(&booking),
        json!({ "subtotal": "100.00", "tax": "0", "promoCode": "USED10" }),
        Some(&token),
    )
    .await;

    let response = app
        .delete(&format!("/api/admin/promo-codes/{}", used["id"].as_str().unwrap()), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = app
        .patch(
            &format!("/api/admin/promo-codes/{}", used["id"].as_str().unwrap()),
            json!({ "isActive": false }),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["isActive"], false);

    let response = app
        .delete(&format!("/api/admin/promo-codes/{}", unused["id"].as_str().unwrap()), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_invoice_payment_status_tracks_paid_at() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let booking = app.booking_with_customer(&token, "ana@example.com").await;

    let response = app
        .post(
            &invoice_uri(&booking),
            json!({ "subtotal": "500.00", "tax": "0", "dueDate": "2025-05-15" }),
            Some(&token),
        )
        .await;
    assert_eq!(response.body["data"]["dueDate"], "2025-05-15");
    assert!(response.body["data"]["paidAt"].is_null());
    let uri = format!("/api/admin/invoices/{}", response.body["data"]["id"].as_str().unwrap());

    let response = app.patch(&uri, json!({ "paymentStatus": "PAID" }), Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!response.body["data"]["paidAt"].is_null());

    let response = app.patch(&uri, json!({ "paymentStatus": "OVERDUE" }), Some(&token)).await;
    assert!(response.body["data"]["paidAt"].is_null());

    let response = app.get("/api/admin/invoices?paymentStatus=OVERDUE", Some(&token)).await;
    assert_eq!(response.body["data"].as_array().unwrap().len(), 1);
}
