//! Modelo de Quote
//!
//! Solicitud de cotización de un cliente potencial. Se crea desde el
//! formulario público y la modifican el panel de administración y el
//! barrido de recordatorios.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Antigüedad mínima para que una cotización abierta reciba recordatorio
pub const REMINDER_AFTER_HOURS: i64 = 24;

/// Estado de la cotización - mapea al ENUM quote_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "quote_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Pending,
    Reviewing,
    Accepted,
    Declined,
}

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 4] = [
        QuoteStatus::Pending,
        QuoteStatus::Reviewing,
        QuoteStatus::Accepted,
        QuoteStatus::Declined,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuoteStatus::Pending => "PENDING",
            QuoteStatus::Reviewing => "REVIEWING",
            QuoteStatus::Accepted => "ACCEPTED",
            QuoteStatus::Declined => "DECLINED",
        }
    }

    /// Cotización aún sin respuesta definitiva
    pub fn is_open(self) -> bool {
        matches!(self, QuoteStatus::Pending | QuoteStatus::Reviewing)
    }

    /// Estado que cuenta como respuesta al cliente
    pub fn is_response(self) -> bool {
        matches!(self, QuoteStatus::Accepted | QuoteStatus::Declined)
    }

    /// Transiciones permitidas; mantener el mismo estado siempre es válido
    pub fn can_transition_to(self, next: QuoteStatus) -> bool {
        use QuoteStatus::*;
        self == next
            || matches!(
                (self, next),
                (Pending, Reviewing)
                    | (Pending, Accepted)
                    | (Pending, Declined)
                    | (Reviewing, Accepted)
                    | (Reviewing, Declined)
                    | (Declined, Reviewing)
            )
    }
}

/// Quote principal - mapea exactamente a la tabla quotes
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: Uuid,
    pub quote_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub service_type: String,
    pub event_type: String,
    pub event_date: NaiveDate,
    pub pickup_time: Option<String>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub passenger_count: i32,
    pub vehicle_preference: Option<String>,
    pub special_requests: Option<String>,
    pub status: QuoteStatus,
    pub quoted_price: Option<Decimal>,
    pub admin_notes: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub customer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Predicado del barrido de recordatorios; `cutoff` sale de `reminder_cutoff`
    pub fn needs_reminder(&self, cutoff: DateTime<Utc>) -> bool {
        self.status.is_open() && self.reminder_sent_at.is_none() && self.created_at < cutoff
    }
}

/// Instante límite: cotizaciones creadas antes de él son candidatas
pub fn reminder_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(REMINDER_AFTER_HOURS)
}

/// Datos validados para insertar una cotización
#[derive(Debug, Clone)]
pub struct NewQuote {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub service_type: String,
    pub event_type: String,
    pub event_date: NaiveDate,
    pub pickup_time: Option<String>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub passenger_count: i32,
    pub vehicle_preference: Option<String>,
    pub special_requests: Option<String>,
    pub customer_id: Option<Uuid>,
}

/// Cambios administrativos sobre una cotización (None = sin cambio)
#[derive(Debug, Clone, Default)]
pub struct QuoteChanges {
    pub status: Option<QuoteStatus>,
    pub quoted_price: Option<Decimal>,
    pub admin_notes: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub customer_id: Option<Uuid>,
}

/// Filtros para el listado de cotizaciones
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteFilters {
    pub status: Option<QuoteStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(status: QuoteStatus, created_at: DateTime<Utc>) -> Quote {
        Quote {
            id: Uuid::new_v4(),
            quote_number: "IL250601143022ABCD".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
            email: "ana@example.com".to_string(),
            phone: "3125550199".to_string(),
            service_type: "HOURLY".to_string(),
            event_type: "WEDDING".to_string(),
            event_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            pickup_time: None,
            pickup_location: None,
            dropoff_location: None,
            passenger_count: 2,
            vehicle_preference: None,
            special_requests: None,
            status,
            quoted_price: None,
            admin_notes: None,
            responded_at: None,
            reminder_sent_at: None,
            customer_id: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_status_transitions() {
        use QuoteStatus::*;
        assert!(Pending.can_transition_to(Reviewing));
        assert!(Pending.can_transition_to(Accepted));
        assert!(Reviewing.can_transition_to(Declined));
        assert!(Declined.can_transition_to(Reviewing));
        assert!(Accepted.can_transition_to(Accepted));
        assert!(!Accepted.can_transition_to(Pending));
        assert!(!Reviewing.can_transition_to(Pending));
        assert!(!Declined.can_transition_to(Accepted));
    }

    #[test]
    fn test_needs_reminder() {
        let now = Utc::now();
        let cutoff = reminder_cutoff(now);
        let old = now - Duration::hours(25);
        let fresh = now - Duration::hours(2);

        assert!(quote(QuoteStatus::Pending, old).needs_reminder(cutoff));
        assert!(quote(QuoteStatus::Reviewing, old).needs_reminder(cutoff));
        assert!(!quote(QuoteStatus::Pending, fresh).needs_reminder(cutoff));
        assert!(!quote(QuoteStatus::Accepted, old).needs_reminder(cutoff));

        let mut reminded = quote(QuoteStatus::Pending, old);
        reminded.reminder_sent_at = Some(now);
        assert!(!reminded.needs_reminder(cutoff));
    }
}
