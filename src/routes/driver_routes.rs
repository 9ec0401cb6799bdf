use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::driver_controller::DriverController;
use crate::dto::driver_dto::{CreateDriverRequest, UpdateDriverRequest};
use crate::dto::{ApiJson, ApiResponse};
use crate::middleware::AdminSession;
use crate::models::Driver;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// `/api/admin/drivers`
pub fn create_admin_driver_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_drivers).post(create_driver))
        .route("/:id", get(get_driver).patch(update_driver).delete(delete_driver))
}

async fn list_drivers(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<ApiResponse<Vec<Driver>>>, AppError> {
    let controller = DriverController::new(&state);
    let drivers = controller.list().await?;
    Ok(Json(ApiResponse::success(drivers)))
}

async fn create_driver(
    State(state): State<AppState>,
    _session: AdminSession,
    ApiJson(request): ApiJson<CreateDriverRequest>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    let controller = DriverController::new(&state);
    let driver = controller.create(request).await?;
    Ok(Json(ApiResponse::success(driver)))
}

async fn get_driver(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    let controller = DriverController::new(&state);
    let driver = controller.get(id).await?;
    Ok(Json(ApiResponse::success(driver)))
}

async fn update_driver(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateDriverRequest>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    let controller = DriverController::new(&state);
    let driver = controller.update(id, request).await?;
    Ok(Json(ApiResponse::success(driver)))
}

async fn delete_driver(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = DriverController::new(&state);
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Driver deleted")))
}
