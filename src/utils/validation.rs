//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

use crate::utils::errors::{missing_field_error, AppError, AppResult};

lazy_static! {
    static ref PROMO_CODE_RE: Regex = Regex::new(r"^[A-Z0-9]+$").expect("promo code regex");
    static ref SLUG_RE: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug regex");
}

/// Longitud mínima de contraseña para cuentas de cliente
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Longitud máxima de un código promocional
pub const MAX_PROMO_CODE_LENGTH: usize = 32;
/// Mayor importe representable en una columna `NUMERIC(10, 2)`
pub const MAX_MONEY_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Exigir un campo de texto presente y no vacío; devuelve el valor recortado
pub fn require_text(field: &str, value: Option<&str>) -> AppResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(missing_field_error(field)),
    }
}

/// Exigir un campo presente de cualquier tipo
pub fn require<T: Clone>(field: &str, value: &Option<T>) -> AppResult<T> {
    value.clone().ok_or_else(|| missing_field_error(field))
}

/// Normalizar texto opcional: recorta y descarta cadenas vacías
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validar y convertir string a fecha
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        let mut error = ValidationError::new("date");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"YYYY-MM-DD".to_string());
        error
    })
}

/// Instante en RFC 3339 o fecha `YYYY-MM-DD` (medianoche UTC)
pub fn validate_instant(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    validate_date(value)
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| {
            let mut error = ValidationError::new("datetime");
            error.add_param("value".into(), &value.to_string());
            error
        })
}

/// Validar una hora de recogida en formato `HH:MM`
pub fn validate_time(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
        let mut error = ValidationError::new("time");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"HH:MM".to_string());
        error
    })
}

/// Validar formato de teléfono (básico)
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let clean_phone = value.chars().filter(|c| c.is_ascii_digit()).collect::<String>();
    if clean_phone.len() < 7 || clean_phone.len() > 15 {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar un importe monetario: no negativo, con a lo sumo 2 decimales y
/// dentro del rango de `NUMERIC(10, 2)`. El valor devuelto siempre tiene escala 2.
pub fn validate_money(field: &str, value: Decimal) -> AppResult<Decimal> {
    if validate_non_negative(value).is_err() {
        return Err(AppError::BadRequest(format!("{} must not be negative", field)));
    }
    if value > MAX_MONEY_AMOUNT {
        return Err(AppError::BadRequest(format!(
            "{} must not exceed {}",
            field, MAX_MONEY_AMOUNT
        )));
    }
    if value.normalize().scale() > 2 {
        return Err(AppError::BadRequest(format!(
            "{} must have at most 2 decimal places",
            field
        )));
    }
    let mut amount = value.round_dp(2);
    amount.rescale(2);
    Ok(amount)
}

/// Validar la contraseña de un cliente
pub fn validate_password(value: &str) -> AppResult<()> {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Validar un código promocional tal como fue enviado.
///
/// Solo se aceptan mayúsculas y dígitos; el valor devuelto es el que se persiste.
pub fn validate_promo_code(value: &str) -> AppResult<String> {
    let code = value.trim();
    if code.is_empty() {
        return Err(missing_field_error("code"));
    }
    if code.len() > MAX_PROMO_CODE_LENGTH || !PROMO_CODE_RE.is_match(code) {
        return Err(AppError::BadRequest(
            "Promo code may only contain uppercase letters and digits".to_string(),
        ));
    }
    Ok(code.to_uppercase())
}

/// Validar slug de vehículo (`limo-stretch-10`)
pub fn validate_slug(value: &str) -> AppResult<String> {
    let slug = value.trim();
    if !SLUG_RE.is_match(slug) {
        return Err(AppError::BadRequest(
            "Slug may only contain lowercase letters, digits and single dashes".to_string(),
        ));
    }
    Ok(slug.to_string())
}

/// Convertir un error de validator en un `AppError` con el nombre del campo
pub fn field_error(field: &'static str, error: ValidationError) -> AppError {
    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);
    AppError::Validation(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_date() {
        assert!(validate_date("2025-06-01").is_ok());
        assert!(validate_date("2025/06/01").is_err());
    }

    #[test]
    fn test_validate_instant() {
        let instant = validate_instant("2025-06-01T10:00:00Z").unwrap();
        assert_eq!(instant.to_rfc3339(), "2025-06-01T10:00:00+00:00");
        let day = validate_instant("2025-06-01").unwrap();
        assert_eq!(day.to_rfc3339(), "2025-06-01T00:00:00+00:00");
        assert!(validate_instant("junio").is_err());
    }

    #[test]
    fn test_validate_time() {
        assert!(validate_time("14:00").is_ok());
        assert!(validate_time("25:00").is_err());
        assert!(validate_time("2pm").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("(312) 555-0199").is_ok());
        assert!(validate_phone("123").is_err());
    }

    #[test]
    fn test_require_text_rejects_blank() {
        assert!(require_text("firstName", Some("  ")).is_err());
        assert!(require_text("firstName", None).is_err());
        assert_eq!(require_text("firstName", Some(" Ana ")).unwrap(), "Ana");
    }

    #[test]
    fn test_validate_money() {
        assert!(validate_money("subtotal", Decimal::from_str("10.50").unwrap()).is_ok());
        assert!(validate_money("subtotal", Decimal::from_str("10.500").unwrap()).is_ok());
        assert!(validate_money("subtotal", Decimal::from_str("10.505").unwrap()).is_err());
        assert!(validate_money("subtotal", Decimal::from_str("-1").unwrap()).is_err());
        assert_eq!(
            validate_money("subtotal", Decimal::from(500)).unwrap().to_string(),
            "500.00"
        );
        assert_eq!(
            validate_money("subtotal", Decimal::from_str("99999999.99").unwrap()).unwrap(),
            MAX_MONEY_AMOUNT
        );
        assert!(validate_money("subtotal", Decimal::from_str("100000000").unwrap()).is_err());
        assert!(validate_money("subtotal", Decimal::MAX).is_err());
    }

    #[test]
    fn test_validate_promo_code() {
        assert_eq!(validate_promo_code("SUMMER25").unwrap(), "SUMMER25");
        assert_eq!(validate_promo_code("  VIP10 ").unwrap(), "VIP10");
        assert!(validate_promo_code("summer25").is_err());
        assert!(validate_promo_code("SUMMER-25").is_err());
        assert!(validate_promo_code("").is_err());
        assert!(validate_promo_code(&"A".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("stretch-limo-10").is_ok());
        assert!(validate_slug("Stretch Limo").is_err());
        assert!(validate_slug("double--dash").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
    }
}
