use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::booking_controller::BookingController;
use crate::controllers::quote_controller::QuoteController;
use crate::dto::booking_dto::{CreateBookingRequest, CreateBookingResponse};
use crate::dto::quote_dto::{
    CreateQuoteRequest, CreateQuoteResponse, QuoteDetail, UpdateQuoteRequest, UpdateQuoteResponse,
};
use crate::dto::{ApiJson, ApiResponse};
use crate::middleware::AdminSession;
use crate::models::{Quote, QuoteFilters};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Formulario público: `/api/quotes`
pub fn create_quote_router() -> Router<AppState> {
    Router::new().route("/", post(create_quote))
}

/// Gestión administrativa: `/api/admin/quotes`
pub fn create_admin_quote_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quotes))
        .route("/:id", get(get_quote).patch(update_quote).delete(delete_quote))
        .route("/:id/create-booking", post(create_booking))
}

async fn create_quote(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateQuoteRequest>,
) -> Result<Json<CreateQuoteResponse>, AppError> {
    let controller = QuoteController::new(&state);
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn list_quotes(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(filters): Query<QuoteFilters>,
) -> Result<Json<ApiResponse<Vec<Quote>>>, AppError> {
    let controller = QuoteController::new(&state);
    let quotes = controller.list(filters).await?;
    Ok(Json(ApiResponse::success(quotes)))
}

async fn get_quote(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<QuoteDetail>>, AppError> {
    let controller = QuoteController::new(&state);
    let quote = controller.get(id).await?;
    Ok(Json(ApiResponse::success(quote)))
}

async fn update_quote(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateQuoteRequest>,
) -> Result<Json<UpdateQuoteResponse>, AppError> {
    let controller = QuoteController::new(&state);
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_quote(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = QuoteController::new(&state);
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Quote deleted")))
}

async fn create_booking(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> Result<Json<CreateBookingResponse>, AppError> {
    let controller = BookingController::new(&state);
    let response = controller.create_from_quote(id, request).await?;
    Ok(Json(response))
}
