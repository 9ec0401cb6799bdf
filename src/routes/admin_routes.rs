use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};

use super::{booking_routes, driver_routes, invoice_routes, promo_code_routes, quote_routes, vehicle_routes};
use crate::controllers::admin_controller::AdminController;
use crate::dto::admin_dto::{AdminAuthResponse, DashboardSummary};
use crate::dto::customer_dto::LoginRequest;
use crate::dto::{ApiJson, ApiResponse};
use crate::middleware::{clear_session_cookie, session_cookie, AdminSession, LOGIN_PATH};
use crate::models::Admin;
use crate::services::PrincipalRole;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// API de administración: `/api/admin`
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/dashboard", get(dashboard))
        .nest("/quotes", quote_routes::create_admin_quote_router())
        .nest("/bookings", booking_routes::create_admin_booking_router())
        .nest("/invoices", invoice_routes::create_admin_invoice_router())
        .nest("/promo-codes", promo_code_routes::create_admin_promo_code_router())
        .nest("/drivers", driver_routes::create_admin_driver_router())
        .nest("/vehicles", vehicle_routes::create_admin_vehicle_router())
}

/// Páginas del panel; la guardia ya exige sesión salvo en el login
pub fn create_admin_pages_router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard_page))
        .route(LOGIN_PATH, get(login_page))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<AdminAuthResponse>), AppError> {
    let controller = AdminController::new(&state);
    let (token, admin) = controller.login(request).await?;

    let cookie = session_cookie(PrincipalRole::Admin, token.clone(), state.config.is_production());
    Ok((
        jar.add(cookie),
        Json(AdminAuthResponse {
            success: true,
            token,
            admin,
        }),
    ))
}

async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    let cookie = clear_session_cookie(PrincipalRole::Admin, state.config.is_production());
    (jar.add(cookie), Json(ApiResponse::message("Logged out")))
}

async fn me(session: AdminSession) -> Json<ApiResponse<Admin>> {
    Json(ApiResponse::success(session.admin))
}

async fn dashboard(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<ApiResponse<DashboardSummary>>, AppError> {
    let controller = AdminController::new(&state);
    let summary = controller.dashboard().await?;
    Ok(Json(ApiResponse::success(summary)))
}

async fn dashboard_page(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let controller = AdminController::new(&state);
    let summary = controller.dashboard().await?;
    Ok(Json(json!({
        "page": "admin-dashboard",
        "summary": summary,
    })))
}

async fn login_page() -> Json<Value> {
    Json(json!({
        "page": "admin-login",
        "loginEndpoint": "/api/admin/login",
    }))
}
