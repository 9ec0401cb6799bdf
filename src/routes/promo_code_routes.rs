use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::promo_code_controller::PromoCodeController;
use crate::dto::promo_code_dto::{
    CreatePromoCodeRequest, UpdatePromoCodeRequest, ValidatePromoCodeRequest,
    ValidatePromoCodeResponse,
};
use crate::dto::{ApiJson, ApiResponse};
use crate::middleware::AdminSession;
use crate::models::PromoCode;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Consulta pública: `/api/promo-codes`
pub fn create_promo_code_router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_promo_code))
}

/// `/api/admin/promo-codes`
pub fn create_admin_promo_code_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_promo_codes).post(create_promo_code))
        .route(
            "/:id",
            get(get_promo_code)
                .patch(update_promo_code)
                .delete(delete_promo_code),
        )
}

async fn validate_promo_code(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ValidatePromoCodeRequest>,
) -> Result<Json<ValidatePromoCodeResponse>, AppError> {
    let controller = PromoCodeController::new(&state);
    let response = controller.validate(request).await?;
    Ok(Json(response))
}

async fn list_promo_codes(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<ApiResponse<Vec<PromoCode>>>, AppError> {
    let controller = PromoCodeController::new(&state);
    let promo_codes = controller.list().await?;
    Ok(Json(ApiResponse::success(promo_codes)))
}

async fn create_promo_code(
    State(state): State<AppState>,
    _session: AdminSession,
    ApiJson(request): ApiJson<CreatePromoCodeRequest>,
) -> Result<Json<ApiResponse<PromoCode>>, AppError> {
    let controller = PromoCodeController::new(&state);
    let promo = controller.create(request).await?;
    Ok(Json(ApiResponse::success(promo)))
}

async fn get_promo_code(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PromoCode>>, AppError> {
    let controller = PromoCodeController::new(&state);
    let promo = controller.get(id).await?;
    Ok(Json(ApiResponse::success(promo)))
}

async fn update_promo_code(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdatePromoCodeRequest>,
) -> Result<Json<ApiResponse<PromoCode>>, AppError> {
    let controller = PromoCodeController::new(&state);
    let promo = controller.update(id, request).await?;
    Ok(Json(ApiResponse::success(promo)))
}

async fn delete_promo_code(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = PromoCodeController::new(&state);
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Promo code deleted")))
}
