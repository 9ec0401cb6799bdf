//! Modelo de Invoice
//!
//! Documento de cobro de una reserva. El total siempre es
//! `subtotal - promo_discount + tax`, calculado en `Decimal`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::{validate_money, MAX_MONEY_AMOUNT};

/// Estado de pago - mapea al ENUM payment_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub promo_code_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub promo_discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Importes de una factura ya validados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub promo_discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl InvoiceTotals {
    /// Calcular el total a partir de importes con precisión de centavos.
    ///
    /// Rechaza importes negativos, con más de 2 decimales, descuentos
    /// mayores que el subtotal o un total fuera de `NUMERIC(10, 2)`.
    pub fn compute(subtotal: Decimal, promo_discount: Decimal, tax: Decimal) -> AppResult<Self> {
        let subtotal = validate_money("subtotal", subtotal)?;
        let promo_discount = validate_money("promoDiscount", promo_discount)?;
        let tax = validate_money("tax", tax)?;

        if promo_discount > subtotal {
            return Err(AppError::BadRequest(
                "promoDiscount cannot exceed subtotal".to_string(),
            ));
        }

        let total = subtotal
            .checked_sub(promo_discount)
            .and_then(|net| net.checked_add(tax))
            .filter(|total| *total <= MAX_MONEY_AMOUNT)
            .ok_or_else(|| AppError::BadRequest("Invoice total is out of range".to_string()))?;

        Ok(Self {
            subtotal,
            promo_discount,
            tax,
            total,
        })
    }
}

/// Datos para insertar una factura
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub promo_code_id: Option<Uuid>,
    pub totals: InvoiceTotals,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Cambios sobre una factura (None = sin cambio)
#[derive(Debug, Clone, Default)]
pub struct InvoiceChanges {
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// `Some(None)` limpia la marca de pago
    pub paid_at: Option<Option<DateTime<Utc>>>,
}

/// Filtros para el listado de facturas
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFilters {
    pub payment_status: Option<PaymentStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn test_total_formula() {
        let totals = InvoiceTotals::compute(dec("500.00"), dec("50.00"), dec("36.13")).unwrap();
        assert_eq!(totals.total, dec("486.13"));
    }

    #[test]
    fn test_zero_tax_is_accepted() {
        let totals = InvoiceTotals::compute(dec("120.00"), Decimal::ZERO, Decimal::ZERO).unwrap();
        assert_eq!(totals.total, dec("120.00"));
    }

    #[test]
    fn test_rejects_invalid_amounts() {
        assert!(InvoiceTotals::compute(dec("-1"), Decimal::ZERO, Decimal::ZERO).is_err());
        assert!(InvoiceTotals::compute(dec("10.001"), Decimal::ZERO, Decimal::ZERO).is_err());
        assert!(InvoiceTotals::compute(dec("10"), dec("11"), Decimal::ZERO).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_amounts() {
        assert!(InvoiceTotals::compute(Decimal::MAX, Decimal::ZERO, dec("1")).is_err());
        assert!(InvoiceTotals::compute(dec("100.00"), Decimal::ZERO, Decimal::MAX).is_err());

        assert!(
            InvoiceTotals::compute(dec("99999999.99"), Decimal::ZERO, dec("0.01")).is_err()
        );
        let totals =
            InvoiceTotals::compute(dec("99999999.99"), dec("0.01"), dec("0.01")).unwrap();
        assert_eq!(totals.total, MAX_MONEY_AMOUNT);
    }

    #[test]
    fn test_randomized_totals_have_no_drift() {
        let mut rng = rand::thread_rng();
        for _ in 0..1_000 {
            let subtotal_cents: i64 = rng.gen_range(0..10_000_000);
            let discount_cents: i64 = rng.gen_range(0..=subtotal_cents);
            let tax_cents: i64 = rng.gen_range(0..1_000_000);

            let totals = InvoiceTotals::compute(
                Decimal::new(subtotal_cents, 2),
                Decimal::new(discount_cents, 2),
                Decimal::new(tax_cents, 2),
            )
            .unwrap();

            let expected = Decimal::new(subtotal_cents - discount_cents + tax_cents, 2);
            assert_eq!(totals.total, expected);
            assert_eq!(totals.total, totals.subtotal - totals.promo_discount + totals.tax);
            assert!(totals.total.scale() <= 2);
        }
    }
}
