use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Quote, QuoteStatus};
use crate::notifications::{NotificationOutcome, QuoteNotifications};

// Request del formulario público de cotización
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service_type: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub passenger_count: Option<i32>,
    pub pickup_time: Option<String>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub vehicle_preference: Option<String>,
    pub special_requests: Option<String>,
}

// Response de cotización creada
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteResponse {
    pub success: bool,
    pub quote_number: String,
    pub quote_id: Uuid,
    pub status: QuoteStatus,
    pub notifications: QuoteNotifications,
}

// Request de respuesta administrativa
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuoteRequest {
    pub status: Option<QuoteStatus>,
    pub quoted_price: Option<Decimal>,
    pub admin_notes: Option<String>,
    pub notify_customer: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuoteResponse {
    pub success: bool,
    pub quote: Quote,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationOutcome>,
}

// Detalle con la reserva vinculada, si existe
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDetail {
    #[serde(flatten)]
    pub quote: Quote,
    pub booking_id: Option<Uuid>,
}
