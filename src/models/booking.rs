//! Modelo de Booking
//!
//! Reserva confirmada, normalmente derivada de una cotización aceptada.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de la reserva - mapea al ENUM booking_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "booking_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 3] = [
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        self == next
            || matches!(
                (self, next),
                (BookingStatus::Confirmed, BookingStatus::Completed)
                    | (BookingStatus::Confirmed, BookingStatus::Cancelled)
            )
    }
}

/// Booking principal - mapea exactamente a la tabla bookings
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub booking_number: String,
    pub quote_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub status: BookingStatus,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub event_date: NaiveDate,
    pub pickup_time: String,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub passenger_count: i32,
    pub total_price: Decimal,
    pub paid_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Saldo pendiente de pago
    pub fn balance_due(&self) -> Decimal {
        self.total_price - self.paid_amount
    }
}

/// Datos de la reserva a crear a partir de una cotización
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub event_date: NaiveDate,
    pub pickup_time: String,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub passenger_count: i32,
    pub total_price: Decimal,
    pub notes: Option<String>,
}

/// Cambios sobre una reserva (None = sin cambio)
#[derive(Debug, Clone, Default)]
pub struct BookingChanges {
    pub status: Option<BookingStatus>,
    pub paid_amount: Option<Decimal>,
    pub pickup_time: Option<String>,
    pub notes: Option<String>,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
}

/// Filtros para el listado de reservas
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilters {
    pub status: Option<BookingStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_transitions() {
        use BookingStatus::*;
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Confirmed));
        assert!(!Cancelled.can_transition_to(Completed));
    }
}
