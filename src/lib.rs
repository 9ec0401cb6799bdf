//! Back end de reservas de limusinas
//!
//! Cotización → reserva → factura, códigos promocionales, portal de clientes,
//! panel de administración y barrido de recordatorios.

pub mod config;
pub mod controllers;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::{admin_guard, cors_layer};
use crate::state::AppState;

/// Router listo para servir: rutas, guardia de `/admin`, CORS y trazas
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    routes::create_app_router()
        .layer(axum::middleware::from_fn_with_state(state.clone(), admin_guard))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
