use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::controllers::customer_controller::CustomerController;
use crate::dto::booking_dto::BookingDetail;
use crate::dto::customer_dto::{
    CustomerAuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, RegisterResponse,
    ResetPasswordRequest, TokenRequest, UpdateProfileRequest,
};
use crate::dto::{ApiJson, ApiResponse};
use crate::middleware::{clear_session_cookie, session_cookie, CustomerSession};
use crate::models::{Booking, Customer, Invoice, Quote};
use crate::services::PrincipalRole;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Portal de clientes: `/api/customer`
pub fn create_customer_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify-email", post(verify_email))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/me", get(me).patch(update_me))
        .route("/quotes", get(my_quotes))
        .route("/bookings", get(my_bookings))
        .route("/bookings/:id", get(my_booking))
        .route("/invoices", get(my_invoices))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let controller = CustomerController::new(&state);
    let response = controller.register(request).await?;
    Ok(Json(response))
}

async fn verify_email(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TokenRequest>,
) -> Result<Json<ApiResponse<Customer>>, AppError> {
    let controller = CustomerController::new(&state);
    let customer = controller.verify_email(request).await?;
    Ok(Json(ApiResponse::success_with_message(customer, "Email verified")))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<CustomerAuthResponse>), AppError> {
    let controller = CustomerController::new(&state);
    let (token, customer) = controller.login(request).await?;

    let cookie = session_cookie(PrincipalRole::Customer, token.clone(), state.config.is_production());
    Ok((
        jar.add(cookie),
        Json(CustomerAuthResponse {
            success: true,
            token,
            customer,
        }),
    ))
}

async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    let cookie = clear_session_cookie(PrincipalRole::Customer, state.config.is_production());
    (jar.add(cookie), Json(ApiResponse::message("Logged out")))
}

async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = CustomerController::new(&state);
    controller.forgot_password(request).await?;
    Ok(Json(ApiResponse::message(
        "If an account exists for this email, a reset link has been sent",
    )))
}

async fn reset_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = CustomerController::new(&state);
    controller.reset_password(request).await?;
    Ok(Json(ApiResponse::message("Password updated")))
}

async fn me(session: CustomerSession) -> Json<ApiResponse<Customer>> {
    Json(ApiResponse::success(session.customer))
}

async fn update_me(
    State(state): State<AppState>,
    session: CustomerSession,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<Customer>>, AppError> {
    let controller = CustomerController::new(&state);
    let customer = controller.update_profile(&session.customer, request).await?;
    Ok(Json(ApiResponse::success(customer)))
}

async fn my_quotes(
    State(state): State<AppState>,
    session: CustomerSession,
) -> Result<Json<ApiResponse<Vec<Quote>>>, AppError> {
    let controller = CustomerController::new(&state);
    let quotes = controller.quotes(&session.customer).await?;
    Ok(Json(ApiResponse::success(quotes)))
}

async fn my_bookings(
    State(state): State<AppState>,
    session: CustomerSession,
) -> Result<Json<ApiResponse<Vec<Booking>>>, AppError> {
    let controller = CustomerController::new(&state);
    let bookings = controller.bookings(&session.customer).await?;
    Ok(Json(ApiResponse::success(bookings)))
}

async fn my_booking(
    State(state): State<AppState>,
    session: CustomerSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingDetail>>, AppError> {
    let controller = CustomerController::new(&state);
    let booking = controller.booking(&session.customer, id).await?;
    Ok(Json(ApiResponse::success(booking)))
}

async fn my_invoices(
    State(state): State<AppState>,
    session: CustomerSession,
) -> Result<Json<ApiResponse<Vec<Invoice>>>, AppError> {
    let controller = CustomerController::new(&state);
    let invoices = controller.invoices(&session.customer).await?;
    Ok(Json(ApiResponse::success(invoices)))
}
