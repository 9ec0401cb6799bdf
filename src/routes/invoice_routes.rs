use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::invoice_controller::InvoiceController;
use crate::dto::invoice_dto::UpdateInvoiceRequest;
use crate::dto::{ApiJson, ApiResponse};
use crate::middleware::AdminSession;
use crate::models::{Invoice, InvoiceFilters};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// `/api/admin/invoices`
pub fn create_admin_invoice_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices))
        .route("/:id", get(get_invoice).patch(update_invoice))
}

async fn list_invoices(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(filters): Query<InvoiceFilters>,
) -> Result<Json<ApiResponse<Vec<Invoice>>>, AppError> {
    let controller = InvoiceController::new(&state);
    let invoices = controller.list(filters).await?;
    Ok(Json(ApiResponse::success(invoices)))
}

async fn get_invoice(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Invoice>>, AppError> {
    let controller = InvoiceController::new(&state);
    let invoice = controller.get(id).await?;
    Ok(Json(ApiResponse::success(invoice)))
}

async fn update_invoice(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateInvoiceRequest>,
) -> Result<Json<ApiResponse<Invoice>>, AppError> {
    let controller = InvoiceController::new(&state);
    let invoice = controller.update(id, request).await?;
    Ok(Json(ApiResponse::success(invoice)))
}
