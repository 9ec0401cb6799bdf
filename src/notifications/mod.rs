//! Notificaciones por email y SMS
//!
//! Los envíos son siempre de mejor esfuerzo: un fallo nunca revierte la
//! operación principal y se devuelve al llamador como `NotificationOutcome`.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Booking, Customer, Quote};

pub mod email;
pub mod mock;
pub mod sms;
pub mod templates;

/// Timeout de las llamadas HTTP a los proveedores
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Failed to send notification: {0}")]
    SendFailed(String),
    #[error("Invalid configuration for sender: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Mensaje de email en texto plano
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Envío de emails transaccionales
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError>;
}

/// Envío de SMS
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<(), NotificationError>;
}

/// Resultado de un envío de mejor esfuerzo
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotificationOutcome {
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotificationOutcome {
    pub fn sent() -> Self {
        Self { sent: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            sent: false,
            error: Some(error.into()),
        }
    }

    fn from_result(kind: &str, result: Result<(), NotificationError>) -> Self {
        match result {
            Ok(()) => Self::sent(),
            Err(e) => {
                tracing::warn!("📭 Falló el envío de {}: {}", kind, e);
                Self::failed(e.to_string())
            }
        }
    }
}

/// Resultados de los dos avisos de una cotización nueva
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteNotifications {
    pub customer_email: NotificationOutcome,
    pub business_email: NotificationOutcome,
}

/// Fachada sobre los proveedores: arma los mensajes del negocio y los envía
#[derive(Clone)]
pub struct Notifier {
    email: Arc<dyn EmailSender>,
    sms: Arc<dyn SmsSender>,
    business_email: String,
    business_phone: Option<String>,
    public_base_url: String,
}

impl Notifier {
    pub fn new(
        email: Arc<dyn EmailSender>,
        sms: Arc<dyn SmsSender>,
        business_email: String,
        business_phone: Option<String>,
        public_base_url: String,
    ) -> Self {
        Self {
            email,
            sms,
            business_email,
            business_phone,
            public_base_url,
        }
    }

    /// Confirmación al cliente y alerta al negocio, independientes entre sí
    pub async fn quote_received(&self, quote: &Quote) -> QuoteNotifications {
        let customer = templates::quote_confirmation(quote);
        let business = templates::quote_business_alert(quote, &self.business_email);

        let (customer_result, business_result) =
            tokio::join!(self.email.send(&customer), self.email.send(&business));

        QuoteNotifications {
            customer_email: NotificationOutcome::from_result("confirmación de cotización", customer_result),
            business_email: NotificationOutcome::from_result("alerta de cotización", business_result),
        }
    }

    pub async fn quote_response(&self, quote: &Quote) -> NotificationOutcome {
        let message = templates::quote_response(quote);
        NotificationOutcome::from_result("respuesta de cotización", self.email.send(&message).await)
    }

    pub async fn booking_confirmed(&self, booking: &Booking) -> NotificationOutcome {
        let message = templates::booking_confirmation(booking);
        NotificationOutcome::from_result("confirmación de reserva", self.email.send(&message).await)
    }

    pub async fn email_verification(&self, customer: &Customer, token: &str) -> NotificationOutcome {
        let message = templates::email_verification(customer, &self.public_base_url, token);
        NotificationOutcome::from_result("verificación de email", self.email.send(&message).await)
    }

    pub async fn password_reset(&self, customer: &Customer, token: &str) -> NotificationOutcome {
        let message = templates::password_reset(customer, &self.public_base_url, token);
        NotificationOutcome::from_result("restablecimiento de contraseña", self.email.send(&message).await)
    }

    /// Recordatorio por SMS al negocio sobre una cotización sin responder
    pub async fn quote_reminder(&self, quote: &Quote) -> Result<(), NotificationError> {
        let phone = self.business_phone.as_deref().ok_or_else(|| {
            NotificationError::InvalidConfiguration("BUSINESS_PHONE is not configured".to_string())
        })?;
        self.sms.send(phone, &templates::quote_reminder(quote)).await
    }
}
