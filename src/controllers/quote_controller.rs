use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::quote_dto::{
    CreateQuoteRequest, CreateQuoteResponse, QuoteDetail, UpdateQuoteRequest, UpdateQuoteResponse,
};
use crate::models::{NewQuote, Quote, QuoteChanges, QuoteFilters};
use crate::notifications::Notifier;
use crate::repositories::Repositories;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::{
    field_error, optional_text, require, require_text, validate_date, validate_money, validate_phone,
};

pub struct QuoteController {
    repos: Repositories,
    notifier: Notifier,
}

impl QuoteController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repos: state.repos.clone(),
            notifier: state.notifier.clone(),
        }
    }

    /// Alta pública de cotización
    pub async fn create(&self, request: CreateQuoteRequest) -> AppResult<CreateQuoteResponse> {
        // Campos obligatorios en orden de declaración
        let first_name = require_text("firstName", request.first_name.as_deref())?;
        let last_name = require_text("lastName", request.last_name.as_deref())?;
        let email = require_text("email", request.email.as_deref())?;
        let phone = require_text("phone", request.phone.as_deref())?;
        let service_type = require_text("serviceType", request.service_type.as_deref())?;
        let event_type = require_text("eventType", request.event_type.as_deref())?;
        let event_date = require_text("eventDate", request.event_date.as_deref())?;
        let passenger_count = require("passengerCount", &request.passenger_count)?;

        request.validate()?;
        validate_phone(&phone).map_err(|e| field_error("phone", e))?;
        let event_date = validate_date(&event_date).map_err(|e| field_error("eventDate", e))?;

        let email = email.to_lowercase();
        let customer_id = self
            .repos
            .customers
            .find_by_email(&email)
            .await?
            .map(|customer| customer.id);

        let quote = self
            .repos
            .quotes
            .create(NewQuote {
                first_name,
                last_name,
                email,
                phone,
                service_type,
                event_type,
                event_date,
                pickup_time: optional_text(request.pickup_time),
                pickup_location: optional_text(request.pickup_location),
                dropoff_location: optional_text(request.dropoff_location),
                passenger_count,
                vehicle_preference: optional_text(request.vehicle_preference),
                special_requests: optional_text(request.special_requests),
                customer_id,
            })
            .await?;

        tracing::info!("📝 Cotización {} recibida de {}", quote.quote_number, quote.email);

        let notifications = self.notifier.quote_received(&quote).await;

        Ok(CreateQuoteResponse {
            success: true,
            quote_number: quote.quote_number,
            quote_id: quote.id,
            status: quote.status,
            notifications,
        })
    }

    pub async fn list(&self, filters: QuoteFilters) -> AppResult<Vec<Quote>> {
        self.repos.quotes.list(&filters).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<QuoteDetail> {
        let quote = self.find(id).await?;
        let booking_id = self
            .repos
            .bookings
            .find_by_quote(id)
            .await?
            .map(|booking| booking.id);

        Ok(QuoteDetail { quote, booking_id })
    }

    /// Respuesta administrativa: estado, precio y notas
    pub async fn update(&self, id: Uuid, request: UpdateQuoteRequest) -> AppResult<UpdateQuoteResponse> {
        let quote = self.find(id).await?;
        let has_booking = self.repos.bookings.find_by_quote(id).await?.is_some();

        // Con reserva vinculada solo el estado sigue abierto
        if has_booking && (request.admin_notes.is_some() || request.quoted_price.is_some()) {
            return Err(AppError::BadRequest(
                "Quote already has a booking; only status can be changed".to_string(),
            ));
        }

        let mut changes = QuoteChanges {
            admin_notes: request.admin_notes,
            ..QuoteChanges::default()
        };

        if let Some(next) = request.status {
            if !quote.status.can_transition_to(next) {
                return Err(AppError::BadRequest(format!(
                    "Cannot change quote status from {} to {}",
                    quote.status.as_str(),
                    next.as_str()
                )));
            }
            if next.is_response() && quote.responded_at.is_none() {
                changes.responded_at = Some(Utc::now());
            }
            changes.status = Some(next);
        }

        if let Some(price) = request.quoted_price {
            changes.quoted_price = Some(validate_money("quotedPrice", price)?);
        }

        let updated = self.repos.quotes.update(id, changes).await?;
        tracing::info!("✏️ Cotización {} actualizada ({})", updated.quote_number, updated.status.as_str());

        let notification = if request.notify_customer.unwrap_or(false) {
            Some(self.notifier.quote_response(&updated).await)
        } else {
            None
        };

        Ok(UpdateQuoteResponse {
            success: true,
            quote: updated,
            notification,
        })
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let quote = self.find(id).await?;
        if self.repos.bookings.find_by_quote(id).await?.is_some() {
            return Err(AppError::Conflict(
                "Cannot delete a quote that has a booking".to_string(),
            ));
        }

        self.repos.quotes.delete(id).await?;
        tracing::info!("🗑️ Cotización {} eliminada", quote.quote_number);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> AppResult<Quote> {
        self.repos
            .quotes
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Quote", &id.to_string()))
    }
}
