//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Todos los clientes (repositorios,
//! remitentes) se construyen en `main` o en los tests y se inyectan aquí.

use std::sync::Arc;

use crate::config::EnvironmentConfig;
use crate::notifications::Notifier;
use crate::repositories::Repositories;
use crate::services::{JwtService, PasswordService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub repos: Repositories,
    pub notifier: Notifier,
    pub jwt: Arc<JwtService>,
    pub passwords: PasswordService,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, repos: Repositories, notifier: Notifier) -> Self {
        let jwt = Arc::new(JwtService::new(&config.jwt_secret));
        let passwords = PasswordService::new(config.bcrypt_cost);

        Self {
            config: Arc::new(config),
            repos,
            notifier,
            jwt,
            passwords,
        }
    }
}
