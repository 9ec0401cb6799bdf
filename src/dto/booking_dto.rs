use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Booking, BookingStatus, Invoice};
use crate::notifications::NotificationOutcome;

// Request de conversión cotización -> reserva
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub total_price: Option<Decimal>,
    pub pickup_time: Option<String>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub notes: Option<String>,
    pub create_account: Option<bool>,
    #[validate(length(min = 8))]
    pub password: Option<String>,
    /// Enviar el email de confirmación (por defecto sí)
    pub send_confirmation: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingNotifications {
    pub customer_email: NotificationOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub success: bool,
    pub booking: Booking,
    pub customer_id: Option<Uuid>,
    pub account_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<BookingNotifications>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    pub status: Option<BookingStatus>,
    pub paid_amount: Option<Decimal>,
    pub pickup_time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBookingRequest {
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
}

// Detalle de reserva con sus facturas
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub balance_due: Decimal,
    pub invoices: Vec<Invoice>,
}
