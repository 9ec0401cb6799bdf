use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::BootstrapAdmin;
use crate::dto::admin_dto::DashboardSummary;
use crate::dto::customer_dto::LoginRequest;
use crate::models::{Admin, BookingStatus, NewAdmin, QuoteStatus};
use crate::repositories::Repositories;
use crate::services::{JwtService, PasswordService, PrincipalRole};
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::require_text;

pub struct AdminController {
    repos: Repositories,
    passwords: PasswordService,
    jwt: Arc<JwtService>,
}

impl AdminController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repos: state.repos.clone(),
            passwords: state.passwords,
            jwt: state.jwt.clone(),
        }
    }

    /// Devuelve el token emitido y el administrador
    pub async fn login(&self, request: LoginRequest) -> AppResult<(String, Admin)> {
        let email = require_text("email", request.email.as_deref())?;
        let password = require_text("password", request.password.as_deref())?;

        let admin = self.repos.admins.find_by_email(&email).await?;
        let stored_hash = admin.as_ref().map(|admin| admin.password_hash.as_str());
        let verified = self.passwords.verify_account(&password, stored_hash);
        let admin = admin
            .filter(|_| verified)
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        if !admin.is_active {
            return Err(AppError::Forbidden("Account is disabled".to_string()));
        }

        let token = self.jwt.issue(admin.id, &admin.email, PrincipalRole::Admin)?;
        self.repos.admins.touch_last_login(admin.id, Utc::now()).await?;

        tracing::info!("🔑 Login de administrador {}", admin.email);
        Ok((token, admin))
    }

    /// Conteos del panel; los estados sin filas aparecen con 0
    pub async fn dashboard(&self) -> AppResult<DashboardSummary> {
        let mut quotes_by_status: BTreeMap<&'static str, i64> =
            QuoteStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for (status, count) in self.repos.quotes.count_by_status().await? {
            quotes_by_status.insert(status.as_str(), count);
        }

        let mut bookings_by_status: BTreeMap<&'static str, i64> =
            BookingStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for (status, count) in self.repos.bookings.count_by_status().await? {
            bookings_by_status.insert(status.as_str(), count);
        }

        Ok(DashboardSummary {
            quotes_by_status,
            bookings_by_status,
            outstanding_invoice_total: self.repos.invoices.outstanding_total().await?,
        })
    }
}

/// Crear el administrador inicial si todavía no existe
pub async fn ensure_bootstrap_admin(
    repos: &Repositories,
    passwords: PasswordService,
    bootstrap: &BootstrapAdmin,
) -> AppResult<bool> {
    if repos.admins.find_by_email(&bootstrap.email).await?.is_some() {
        tracing::debug!("Administrador inicial {} ya existe", bootstrap.email);
        return Ok(false);
    }

    let admin = repos
        .admins
        .create(NewAdmin {
            email: bootstrap.email.to_lowercase(),
            name: bootstrap.name.clone(),
            password_hash: passwords.hash_password(&bootstrap.password)?,
        })
        .await?;

    tracing::info!("👑 Administrador inicial {} creado", admin.email);
    Ok(true)
}
