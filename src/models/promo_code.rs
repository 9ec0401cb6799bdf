//! Modelo de PromoCode
//!
//! Regla de descuento aplicable a una factura, acotada por ventana de validez
//! y límite de usos.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};

/// Tipo de descuento - mapea al ENUM discount_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "discount_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_booking_amount: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Motivo por el que un código no puede canjearse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromoRejection {
    Inactive,
    NotYetValid,
    Expired,
    UsageLimitReached,
    BelowMinimum(Decimal),
}

impl fmt::Display for PromoRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromoRejection::Inactive => write!(f, "Promo code is not active"),
            PromoRejection::NotYetValid => write!(f, "Promo code is not valid yet"),
            PromoRejection::Expired => write!(f, "Promo code has expired"),
            PromoRejection::UsageLimitReached => {
                write!(f, "Promo code has reached its usage limit")
            }
            PromoRejection::BelowMinimum(min) => {
                write!(f, "Promo code requires a minimum amount of {}", min)
            }
        }
    }
}

impl PromoCode {
    /// Elegibilidad de canje en `now` para un importe dado.
    ///
    /// Los límites de fecha ausentes se tratan como abiertos.
    pub fn check_redeemable(&self, now: DateTime<Utc>, amount: Decimal) -> Result<(), PromoRejection> {
        if !self.is_active {
            return Err(PromoRejection::Inactive);
        }
        if matches!(self.valid_from, Some(from) if now < from) {
            return Err(PromoRejection::NotYetValid);
        }
        if matches!(self.valid_until, Some(until) if now > until) {
            return Err(PromoRejection::Expired);
        }
        if matches!(self.usage_limit, Some(limit) if self.usage_count >= limit) {
            return Err(PromoRejection::UsageLimitReached);
        }
        if let Some(min) = self.min_booking_amount {
            if amount < min {
                return Err(PromoRejection::BelowMinimum(min));
            }
        }
        Ok(())
    }

    /// Descuento aplicable sobre `amount`, con tope en `max_discount` y en el propio importe
    pub fn discount_for(&self, amount: Decimal) -> AppResult<Decimal> {
        let raw = match self.discount_type {
            DiscountType::Percentage => amount
                .checked_mul(self.discount_value)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
                .ok_or_else(|| AppError::BadRequest("Discount is out of range".to_string()))?
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            DiscountType::Fixed => self.discount_value,
        };

        let capped = match self.max_discount {
            Some(max) => raw.min(max),
            None => raw,
        };
        Ok(capped.min(amount).max(Decimal::ZERO))
    }
}

/// Datos validados para crear un código
#[derive(Debug, Clone)]
pub struct NewPromoCode {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_booking_amount: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
}

/// Cambios sobre un código existente (None = sin cambio)
#[derive(Debug, Clone, Default)]
pub struct PromoCodeChanges {
    pub description: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
    pub min_booking_amount: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn promo(discount_type: DiscountType, value: &str) -> PromoCode {
        let now = Utc::now();
        PromoCode {
            id: Uuid::new_v4(),
            code: "SUMMER25".to_string(),
            description: None,
            discount_type,
            discount_value: dec(value),
            min_booking_amount: None,
            max_discount: None,
            usage_limit: None,
            usage_count: 0,
            valid_from: Some(now - Duration::days(1)),
            valid_until: Some(now + Duration::days(30)),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_percentage_discount_rounds_to_cents() {
        let code = promo(DiscountType::Percentage, "15");
        assert_eq!(code.discount_for(dec("333.33")).unwrap(), dec("50.00"));
        assert_eq!(code.discount_for(dec("100.10")).unwrap(), dec("15.02"));
    }

    #[test]
    fn test_discount_caps() {
        let mut code = promo(DiscountType::Percentage, "50");
        code.max_discount = Some(dec("100"));
        assert_eq!(code.discount_for(dec("500")).unwrap(), dec("100"));

        let fixed = promo(DiscountType::Fixed, "75");
        assert_eq!(fixed.discount_for(dec("40")).unwrap(), dec("40"));
    }

    #[test]
    fn test_discount_overflow_is_an_error() {
        let mut code = promo(DiscountType::Percentage, "100");
        code.discount_value = Decimal::MAX;
        assert!(code.discount_for(Decimal::MAX).is_err());
    }

    #[test]
    fn test_redeemable_window_and_usage() {
        let now = Utc::now();
        let mut code = promo(DiscountType::Fixed, "10");
        assert!(code.check_redeemable(now, dec("100")).is_ok());

        code.valid_from = None;
        code.valid_until = None;
        assert!(code.check_redeemable(now, dec("100")).is_ok());

        code.valid_until = Some(now - Duration::minutes(1));
        assert_eq!(code.check_redeemable(now, dec("100")), Err(PromoRejection::Expired));

        code.valid_until = None;
        code.valid_from = Some(now + Duration::minutes(1));
        assert_eq!(code.check_redeemable(now, dec("100")), Err(PromoRejection::NotYetValid));

        code.valid_from = None;
        code.usage_limit = Some(3);
        code.usage_count = 3;
        assert_eq!(
            code.check_redeemable(now, dec("100")),
            Err(PromoRejection::UsageLimitReached)
        );

        code.usage_count = 2;
        code.min_booking_amount = Some(dec("150"));
        assert!(matches!(
            code.check_redeemable(now, dec("100")),
            Err(PromoRejection::BelowMinimum(_))
        ));

        code.is_active = false;
        assert_eq!(code.check_redeemable(now, dec("200")), Err(PromoRejection::Inactive));
    }
}
