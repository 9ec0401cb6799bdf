use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::dto::{ApiJson, ApiResponse};
use crate::middleware::AdminSession;
use crate::models::VehicleDetails;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Catálogo público: `/api/vehicles`
pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_public_vehicles))
        .route("/:slug", get(get_public_vehicle))
}

/// `/api/admin/vehicles`
pub fn create_admin_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route("/:id", get(get_vehicle).patch(update_vehicle).delete(delete_vehicle))
}

async fn list_public_vehicles(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<VehicleDetails>>>, AppError> {
    let controller = VehicleController::new(&state);
    let vehicles = controller.list(true).await?;
    Ok(Json(ApiResponse::success(vehicles)))
}

async fn get_public_vehicle(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<VehicleDetails>>, AppError> {
    let controller = VehicleController::new(&state);
    let vehicle = controller.get_public(&slug).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}

async fn list_vehicles(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<ApiResponse<Vec<VehicleDetails>>>, AppError> {
    let controller = VehicleController::new(&state);
    let vehicles = controller.list(false).await?;
    Ok(Json(ApiResponse::success(vehicles)))
}

async fn create_vehicle(
    State(state): State<AppState>,
    _session: AdminSession,
    ApiJson(request): ApiJson<CreateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleDetails>>, AppError> {
    let controller = VehicleController::new(&state);
    let vehicle = controller.create(request).await?;
    Ok(Json(ApiResponse::success_with_message(vehicle, "Vehicle created")))
}

async fn get_vehicle(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VehicleDetails>>, AppError> {
    let controller = VehicleController::new(&state);
    let vehicle = controller.get(id).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}

async fn update_vehicle(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleDetails>>, AppError> {
    let controller = VehicleController::new(&state);
    let vehicle = controller.update(id, request).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = VehicleController::new(&state);
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Vehicle deleted")))
}
