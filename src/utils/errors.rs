//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Código SQLSTATE de PostgreSQL para violación de índice único
const UNIQUE_VIOLATION: &str = "23505";
/// Código SQLSTATE de PostgreSQL para violación de llave foránea
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),
}

/// Respuesta de error para la API: `{ error, details?, code }`
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    code: &'static str,
}

impl AppError {
    /// Status HTTP asociado a cada variante
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) | AppError::Hash(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DB_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Jwt(_) => "JWT_ERROR",
            AppError::Hash(_) => "HASH_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let (error, details) = match self {
            AppError::Database(e) => {
                tracing::error!("❌ Database error: {}", e);
                (
                    "An error occurred while accessing the database".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Validation(e) => {
                tracing::warn!("⚠️ Validation error: {}", e);
                let mut fields: Vec<&str> = e.field_errors().keys().copied().collect();
                fields.sort_unstable();
                (
                    format!("Invalid value for field(s): {}", fields.join(", ")),
                    Some(e.to_string()),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("❌ Internal error: {}", msg);
                ("An unexpected error occurred".to_string(), Some(msg))
            }
            AppError::Hash(msg) => {
                tracing::error!("❌ Hash error: {}", msg);
                (
                    "An error occurred while processing credentials".to_string(),
                    Some(msg),
                )
            }
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Jwt(msg) => {
                tracing::warn!("🔒 {}: {}", code, msg);
                (msg, None)
            }
            AppError::NotFound(msg) | AppError::Conflict(msg) | AppError::BadRequest(msg) => {
                tracing::debug!("{}: {}", code, msg);
                (msg, None)
            }
        };

        (status, Json(ErrorResponse { error, details, code })).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Traducir errores de sqlx a errores de dominio.
///
/// Las violaciones de índice único se convierten en `Conflict` con el mensaje
/// indicado y las de llave foránea en `Conflict` genérico; todo lo demás queda
/// como error de base de datos.
pub fn map_db_error(error: sqlx::Error, conflict_message: &str) -> AppError {
    if let sqlx::Error::Database(db_error) = &error {
        match db_error.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return AppError::Conflict(conflict_message.to_string()),
            Some(FOREIGN_KEY_VIOLATION) => {
                return AppError::Conflict(
                    "The record is still referenced by other records".to_string(),
                )
            }
            _ => {}
        }
    }
    AppError::Database(error)
}

/// Nombre de la restricción violada, si el error la expone
pub fn violated_constraint(error: &sqlx::Error) -> Option<String> {
    match error {
        sqlx::Error::Database(db_error) if db_error.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            db_error.constraint().map(str::to_string)
        }
        _ => None,
    }
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Función helper para crear errores de campo requerido
pub fn missing_field_error(field: &str) -> AppError {
    AppError::BadRequest(format!("Missing required field: {}", field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_field_names_the_field() {
        let error = missing_field_error("email");
        assert_eq!(error.to_string(), "Bad request: Missing required field: email");
    }

    #[test]
    fn test_non_database_errors_pass_through_map_db_error() {
        let error = map_db_error(sqlx::Error::RowNotFound, "duplicated");
        assert!(matches!(error, AppError::Database(sqlx::Error::RowNotFound)));
    }
}
