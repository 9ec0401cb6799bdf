//! Rutas HTTP
//!
//! Cada módulo expone un `create_*_router()` que se anida bajo su prefijo.

use axum::{http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

pub mod admin_routes;
pub mod booking_routes;
pub mod cron_routes;
pub mod customer_routes;
pub mod driver_routes;
pub mod invoice_routes;
pub mod promo_code_routes;
pub mod quote_routes;
pub mod vehicle_routes;

/// Router completo de la aplicación, sin capas
pub fn create_app_router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .nest("/api/quotes", quote_routes::create_quote_router())
        .nest("/api/promo-codes", promo_code_routes::create_promo_code_router())
        .nest("/api/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/api/customer", customer_routes::create_customer_router())
        .nest("/api/admin", admin_routes::create_admin_router())
        .nest("/api/cron", cron_routes::create_cron_router())
        .merge(admin_routes::create_admin_pages_router())
        .fallback(not_found)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Route not found",
            "code": "NOT_FOUND",
        })),
    )
}
