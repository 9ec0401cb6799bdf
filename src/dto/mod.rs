//! DTOs de la API
//!
//! Requests y responses en camelCase. Los campos obligatorios de los requests
//! se declaran como `Option` para poder responder con el nombre del campo
//! que falta en lugar de un error genérico de deserialización.

use axum::extract::FromRequest;
use serde::Serialize;

use crate::utils::errors::AppError;

pub mod admin_dto;
pub mod booking_dto;
pub mod customer_dto;
pub mod driver_dto;
pub mod invoice_dto;
pub mod promo_code_dto;
pub mod quote_dto;
pub mod vehicle_dto;

/// Cuerpo JSON cuyo rechazo se convierte en `AppError` (400 con `{error, code}`)
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Envoltura estándar de respuestas exitosas
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

impl ApiResponse<()> {
    /// Respuesta sin datos, solo confirmación
    pub fn message(message: impl Into<String>) -> Self {
        Self::success_with_message((), message)
    }
}
