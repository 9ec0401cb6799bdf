use axum::http::{header, HeaderMap};
use chrono::Utc;
use constant_time_eq::constant_time_eq;

use crate::services::{run_sweep, SweepReport};
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

pub struct CronController {
    state: AppState,
}

impl CronController {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Barrido de recordatorios; exige `Authorization: Bearer <CRON_SECRET>`
    pub async fn check_quotes(&self, headers: &HeaderMap) -> AppResult<SweepReport> {
        self.authorize(headers)?;
        tracing::info!("⏰ Iniciando barrido de recordatorios");
        run_sweep(&self.state.repos, &self.state.notifier, Utc::now()).await
    }

    fn authorize(&self, headers: &HeaderMap) -> AppResult<()> {
        let Some(secret) = self.state.config.cron_secret.as_deref() else {
            return Err(AppError::Unauthorized("Cron secret is not configured".to_string()));
        };

        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match presented {
            Some(token) if constant_time_eq(token.as_bytes(), secret.as_bytes()) => Ok(()),
            _ => Err(AppError::Unauthorized("Invalid cron secret".to_string())),
        }
    }
}
