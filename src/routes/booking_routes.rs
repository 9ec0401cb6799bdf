use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::booking_controller::BookingController;
use crate::controllers::invoice_controller::InvoiceController;
use crate::dto::booking_dto::{AssignBookingRequest, BookingDetail, UpdateBookingRequest};
use crate::dto::invoice_dto::CreateInvoiceRequest;
use crate::dto::{ApiJson, ApiResponse};
use crate::middleware::AdminSession;
use crate::models::{Booking, BookingFilters, Invoice};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// `/api/admin/bookings`
pub fn create_admin_booking_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings))
        .route("/:id", get(get_booking).patch(update_booking))
        .route("/:id/assign", post(assign_booking))
        .route("/:id/create-invoice", post(create_invoice))
}

async fn list_bookings(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(filters): Query<BookingFilters>,
) -> Result<Json<ApiResponse<Vec<Booking>>>, AppError> {
    let controller = BookingController::new(&state);
    let bookings = controller.list(filters).await?;
    Ok(Json(ApiResponse::success(bookings)))
}

async fn get_booking(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingDetail>>, AppError> {
    let controller = BookingController::new(&state);
    let booking = controller.get(id).await?;
    Ok(Json(ApiResponse::success(booking)))
}

async fn update_booking(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateBookingRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let controller = BookingController::new(&state);
    let booking = controller.update(id, request).await?;
    Ok(Json(ApiResponse::success(booking)))
}

async fn assign_booking(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<AssignBookingRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let controller = BookingController::new(&state);
    let booking = controller.assign(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(booking, "Booking assigned")))
}

async fn create_invoice(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<CreateInvoiceRequest>,
) -> Result<Json<ApiResponse<Invoice>>, AppError> {
    let controller = InvoiceController::new(&state);
    let invoice = controller.create(id, request).await?;
    Ok(Json(ApiResponse::success(invoice)))
}
