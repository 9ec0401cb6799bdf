use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::PaymentStatus;

// Request de facturación de una reserva
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub promo_code: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<String>,
    pub due_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceRequest {
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<String>,
    pub due_date: Option<String>,
    pub notes: Option<String>,
}
