use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::dto::booking_dto::BookingDetail;
use crate::dto::customer_dto::{
    ForgotPasswordRequest, LoginRequest, RegisterNotifications, RegisterRequest, RegisterResponse,
    ResetPasswordRequest, TokenRequest, UpdateProfileRequest,
};
use crate::models::{Booking, Customer, CustomerProfileChanges, Invoice, NewCustomer, Quote};
use crate::notifications::Notifier;
use crate::repositories::Repositories;
use crate::services::{random_token, JwtService, PasswordService, PrincipalRole};
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::{
    field_error, optional_text, require_text, validate_password, validate_phone,
};
use std::sync::Arc;

/// Vigencia del token de restablecimiento de contraseña
const RESET_TOKEN_TTL_HOURS: i64 = 1;

pub struct CustomerController {
    repos: Repositories,
    notifier: Notifier,
    passwords: PasswordService,
    jwt: Arc<JwtService>,
}

impl CustomerController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repos: state.repos.clone(),
            notifier: state.notifier.clone(),
            passwords: state.passwords,
            jwt: state.jwt.clone(),
        }
    }

    /// Registro en el portal; la cuenta queda pendiente de verificación
    pub async fn register(&self, request: RegisterRequest) -> AppResult<RegisterResponse> {
        let email = require_text("email", request.email.as_deref())?.to_lowercase();
        let password = require_text("password", request.password.as_deref())?;
        let first_name = require_text("firstName", request.first_name.as_deref())?;
        let last_name = require_text("lastName", request.last_name.as_deref())?;
        let phone = require_text("phone", request.phone.as_deref())?;

        request.validate()?;
        validate_password(&password)?;
        validate_phone(&phone).map_err(|e| field_error("phone", e))?;

        if self.repos.customers.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let verification_token = random_token();
        let customer = self
            .repos
            .customers
            .create(NewCustomer {
                email,
                password_hash: self.passwords.hash_password(&password)?,
                first_name,
                last_name,
                phone,
                email_verified: false,
                verification_token: Some(verification_token.clone()),
            })
            .await?;

        let linked_quotes = self
            .repos
            .quotes
            .link_customer_by_email(&customer.email, customer.id)
            .await?;

        tracing::info!(
            "👤 Cliente {} registrado ({} cotizaciones vinculadas)",
            customer.email,
            linked_quotes
        );

        let verification_email = self
            .notifier
            .email_verification(&customer, &verification_token)
            .await;

        Ok(RegisterResponse {
            success: true,
            customer,
            linked_quotes,
            notifications: RegisterNotifications { verification_email },
        })
    }

    pub async fn verify_email(&self, request: TokenRequest) -> AppResult<Customer> {
        let token = require_text("token", request.token.as_deref())?;
        let customer = self
            .repos
            .customers
            .verify_email(&token)
            .await?
            .ok_or_else(|| AppError::BadRequest("Verification token is invalid".to_string()))?;

        tracing::info!("✅ Email verificado para {}", customer.email);
        Ok(customer)
    }

    /// Devuelve el token emitido y el perfil
    pub async fn login(&self, request: LoginRequest) -> AppResult<(String, Customer)> {
        let email = require_text("email", request.email.as_deref())?;
        let password = require_text("password", request.password.as_deref())?;

        let customer = self.repos.customers.find_by_email(&email).await?;
        let stored_hash = customer.as_ref().map(|customer| customer.password_hash.as_str());
        let verified = self.passwords.verify_account(&password, stored_hash);
        let customer = customer
            .filter(|_| verified)
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        if !customer.is_active {
            return Err(AppError::Forbidden("Account is disabled".to_string()));
        }
        if !customer.email_verified {
            return Err(AppError::Forbidden("Email address is not verified".to_string()));
        }

        let token = self
            .jwt
            .issue(customer.id, &customer.email, PrincipalRole::Customer)?;
        self.repos
            .customers
            .touch_last_login(customer.id, Utc::now())
            .await?;

        tracing::info!("🔑 Login de cliente {}", customer.email);
        Ok((token, customer))
    }

    pub async fn update_profile(&self, customer: &Customer, request: UpdateProfileRequest) -> AppResult<Customer> {
        let phone = optional_text(request.phone);
        if let Some(phone) = phone.as_deref() {
            validate_phone(phone).map_err(|e| field_error("phone", e))?;
        }

        self.repos
            .customers
            .update_profile(
                customer.id,
                CustomerProfileChanges {
                    first_name: optional_text(request.first_name),
                    last_name: optional_text(request.last_name),
                    phone,
                },
            )
            .await
    }

    /// Siempre responde igual, exista o no la cuenta
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> AppResult<()> {
        let Some(email) = optional_text(request.email) else {
            return Ok(());
        };

        let Some(customer) = self
            .repos
            .customers
            .find_by_email(&email)
            .await?
            .filter(|customer| customer.is_active)
        else {
            tracing::debug!("Solicitud de restablecimiento para email desconocido");
            return Ok(());
        };

        let token = random_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
        self.repos
            .customers
            .set_reset_token(customer.id, &token, expires_at)
            .await?;

        let outcome = self.notifier.password_reset(&customer, &token).await;
        tracing::info!("🔁 Restablecimiento solicitado para {} (email enviado: {})", customer.email, outcome.sent);
        Ok(())
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> AppResult<()> {
        let token = require_text("token", request.token.as_deref())?;
        let password = require_text("password", request.password.as_deref())?;
        validate_password(&password)?;

        let password_hash = self.passwords.hash_password(&password)?;
        let changed = self
            .repos
            .customers
            .reset_password(&token, &password_hash, Utc::now())
            .await?;

        if !changed {
            return Err(AppError::BadRequest(
                "Reset token is invalid or expired".to_string(),
            ));
        }

        tracing::info!("🔁 Contraseña restablecida");
        Ok(())
    }

    pub async fn quotes(&self, customer: &Customer) -> AppResult<Vec<Quote>> {
        self.repos.quotes.list_by_customer(customer.id).await
    }

    pub async fn bookings(&self, customer: &Customer) -> AppResult<Vec<Booking>> {
        self.repos.bookings.list_by_customer(customer.id).await
    }

    /// Solo reservas propias; las ajenas se reportan como inexistentes
    pub async fn booking(&self, customer: &Customer, id: Uuid) -> AppResult<BookingDetail> {
        let booking = self
            .repos
            .bookings
            .find_by_id(id)
            .await?
            .filter(|booking| booking.customer_id == Some(customer.id))
            .ok_or_else(|| not_found_error("Booking", &id.to_string()))?;

        let invoices = self.repos.invoices.list_by_booking(id).await?;
        Ok(BookingDetail {
            balance_due: booking.balance_due(),
            booking,
            invoices,
        })
    }

    pub async fn invoices(&self, customer: &Customer) -> AppResult<Vec<Invoice>> {
        self.repos.invoices.list_by_customer(customer.id).await
    }
}
