use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};
use serde::Serialize;

use crate::controllers::cron_controller::CronController;
use crate::services::SweepReport;
use crate::state::AppState;
use crate::utils::errors::AppError;

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: SweepReport,
}

/// Tareas programadas: `/api/cron`
pub fn create_cron_router() -> Router<AppState> {
    Router::new().route("/check-quotes", get(check_quotes))
}

async fn check_quotes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SweepResponse>, AppError> {
    let controller = CronController::new(&state);
    let report = controller.check_quotes(&headers).await?;
    Ok(Json(SweepResponse {
        success: true,
        report,
    }))
}
