//! Arnés de tests: router completo sobre el almacén en memoria y remitentes mock.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use limo_booking::build_router;
use limo_booking::config::{BootstrapAdmin, EmailProviderConfig, EnvironmentConfig};
use limo_booking::controllers::admin_controller::ensure_bootstrap_admin;
use limo_booking::notifications::mock::{MockEmailSender, MockSmsSender};
use limo_booking::notifications::Notifier;
use limo_booking::repositories::memory::MemoryStore;
use limo_booking::repositories::Repositories;
use limo_booking::services::PrincipalRole;
use limo_booking::state::AppState;

pub const CRON_SECRET: &str = "cron-secret-for-tests";
pub const BUSINESS_PHONE: &str = "+13125550100";
pub const BUSINESS_EMAIL: &str = "bookings@limo.test";
pub const ADMIN_EMAIL: &str = "admin@limo.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: MemoryStore,
    pub email: MockEmailSender,
    pub sms: MockSmsSender,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// Valor de la cookie `name` en los `Set-Cookie` de la respuesta
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{}=", name)))
            .map(str::to_string)
    }
}

pub fn test_config() -> EnvironmentConfig {
    EnvironmentConfig {
        environment: "test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        database_url: "postgres://unused".to_string(),
        jwt_secret: "integration-test-secret-with-32-bytes!".to_string(),
        cron_secret: Some(CRON_SECRET.to_string()),
        cors_origins: Vec::new(),
        bcrypt_cost: 4,
        public_base_url: "http://limo.test".to_string(),
        business_email: BUSINESS_EMAIL.to_string(),
        business_phone: Some(BUSINESS_PHONE.to_string()),
        email: EmailProviderConfig {
            api_url: None,
            api_key: None,
            from: "noreply@limo.test".to_string(),
        },
        sms: None,
        bootstrap_admin: Some(BootstrapAdmin {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
            name: "Test Admin".to_string(),
        }),
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: EnvironmentConfig) -> Self {
        let store = MemoryStore::new();
        let email = MockEmailSender::new();
        let sms = MockSmsSender::new();

        let notifier = Notifier::new(
            Arc::new(email.clone()),
            Arc::new(sms.clone()),
            config.business_email.clone(),
            config.business_phone.clone(),
            config.public_base_url.clone(),
        );

        let state = AppState::new(config, Repositories::in_memory(store.clone()), notifier);
        if let Some(bootstrap) = state.config.bootstrap_admin.clone() {
            ensure_bootstrap_admin(&state.repos, state.passwords, &bootstrap)
                .await
                .unwrap();
        }

        Self {
            router: build_router(state.clone()),
            state,
            store,
            email,
            sms,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, headers, body }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, bearer: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, None, bearer).await
    }

    pub async fn post(&self, uri: &str, body: Value, bearer: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, Some(body), bearer).await
    }

    pub async fn patch(&self, uri: &str, body: Value, bearer: Option<&str>) -> TestResponse {
        self.request(Method::PATCH, uri, Some(body), bearer).await
    }

    pub async fn delete(&self, uri: &str, bearer: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, None, bearer).await
    }

    /// Token de administrador obtenido por el login real
    pub async fn admin_token(&self) -> String {
        let response = self
            .post(
                "/api/admin/login",
                json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["token"].as_str().unwrap().to_string()
    }

    /// Token de cliente firmado directamente (para un id arbitrario)
    pub fn customer_token(&self, id: Uuid, email: &str) -> String {
        self.state.jwt.issue(id, email, PrincipalRole::Customer).unwrap()
    }

    pub async fn submit_quote(&self, email: &str) -> Value {
        let response = self.post("/api/quotes", quote_payload(email), None).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body
    }

    pub async fn create_vehicle(&self, token: &str, slug: &str) -> Uuid {
        let response = self
            .post(
                "/api/admin/vehicles",
                json!({
                    "slug": slug,
                    "name": "Stretch Limousine",
                    "category": "LIMOUSINE",
                    "capacity": 10,
                    "hourlyRate": "150.00",
                    "minimumHours": 3,
                    "images": [
                        { "url": "https://cdn.limo.test/a.jpg", "altText": "Front" },
                        { "url": "https://cdn.limo.test/b.jpg" }
                    ]
                }),
                Some(token),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        uuid(&response.body["data"]["id"])
    }

    pub async fn create_driver(&self, token: &str, email: &str) -> Uuid {
        let response = self
            .post(
                "/api/admin/drivers",
                json!({
                    "firstName": "Marco",
                    "lastName": "Diaz",
                    "email": email,
                    "phone": "+1 312 555 0142",
                    "licenseNumber": "D123-4567"
                }),
                Some(token),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        uuid(&response.body["data"]["id"])
    }

    /// Cotización + reserva con cuenta de cliente nueva
    pub async fn booking_with_customer(&self, token: &str, email: &str) -> Value {
        let quote = self.submit_quote(email).await;
        let quote_id = quote["quoteId"].as_str().unwrap();
        let response = self
            .post(
                &format!("/api/admin/quotes/{}/create-booking", quote_id),
                json!({
                    "totalPrice": "500.00",
                    "pickupTime": "14:00",
                    "createAccount": true,
                    "password": "customer-pass"
                }),
                Some(token),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["booking"].clone()
    }

    /// Reserva sin cuenta de cliente
    pub async fn booking_without_customer(&self, token: &str, email: &str) -> Value {
        let quote = self.submit_quote(email).await;
        let quote_id = quote["quoteId"].as_str().unwrap();
        let response = self
            .post(
                &format!("/api/admin/quotes/{}/create-booking", quote_id),
                json!({ "totalPrice": "300.00", "pickupTime": "18:30" }),
                Some(token),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["booking"].clone()
    }
}

pub fn quote_payload(email: &str) -> Value {
    json!({
        "firstName": "Ana",
        "lastName": "Ruiz",
        "email": email,
        "phone": "+1 312 555 0199",
        "serviceType": "HOURLY",
        "eventType": "WEDDING",
        "eventDate": "2025-06-01",
        "passengerCount": 2,
        "pickupLocation": "The Drake Hotel",
        "dropoffLocation": "Navy Pier"
    })
}

pub fn uuid(value: &Value) -> Uuid {
    Uuid::parse_str(value.as_str().unwrap()).unwrap()
}

pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {}", other),
    }
}

/// Token incluido en un enlace `...?token=XYZ` del cuerpo de un email
pub fn token_from_link(body: &str) -> String {
    let start = body.find("token=").unwrap() + "token=".len();
    body[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
