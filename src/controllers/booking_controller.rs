use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::booking_dto::{
    AssignBookingRequest, BookingDetail, BookingNotifications, CreateBookingRequest,
    CreateBookingResponse, UpdateBookingRequest,
};
use crate::models::{Booking, BookingChanges, BookingFilters, BookingStatus, NewBooking, NewCustomer};
use crate::notifications::Notifier;
use crate::repositories::{CustomerLink, QuoteConversion, Repositories};
use crate::services::PasswordService;
use crate::state::AppState;
use crate::utils::errors::{missing_field_error, not_found_error, AppError, AppResult};
use crate::utils::validation::{
    field_error, optional_text, require, require_text, validate_money, validate_time,
};

pub struct BookingController {
    repos: Repositories,
    notifier: Notifier,
    passwords: PasswordService,
}

impl BookingController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repos: state.repos.clone(),
            notifier: state.notifier.clone(),
            passwords: state.passwords,
        }
    }

    /// Convertir una cotización en reserva
    pub async fn create_from_quote(
        &self,
        quote_id: Uuid,
        request: CreateBookingRequest,
    ) -> AppResult<CreateBookingResponse> {
        let quote = self
            .repos
            .quotes
            .find_by_id(quote_id)
            .await?
            .ok_or_else(|| not_found_error("Quote", &quote_id.to_string()))?;

        if self.repos.bookings.find_by_quote(quote_id).await?.is_some() {
            return Err(AppError::BadRequest(
                "A booking already exists for this quote".to_string(),
            ));
        }

        let total_price = validate_money("totalPrice", require("totalPrice", &request.total_price)?)?;
        let pickup_time = require_text("pickupTime", request.pickup_time.as_deref())?;
        validate_time(&pickup_time).map_err(|e| field_error("pickupTime", e))?;
        request.validate()?;

        if let Some(vehicle_id) = request.vehicle_id {
            self.repos
                .vehicles
                .find_by_id(vehicle_id)
                .await?
                .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;
        }
        if let Some(driver_id) = request.driver_id {
            self.repos
                .drivers
                .find_by_id(driver_id)
                .await?
                .ok_or_else(|| not_found_error("Driver", &driver_id.to_string()))?;
        }

        // Cuenta existente, cuenta nueva verificada, o ninguna
        let existing = match quote.customer_id {
            Some(id) => Some(id),
            None => self
                .repos
                .customers
                .find_by_email(&quote.email)
                .await?
                .map(|customer| customer.id),
        };

        let customer = match existing {
            Some(id) => CustomerLink::Existing(id),
            None if request.create_account.unwrap_or(false) => {
                let password = request
                    .password
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| missing_field_error("password"))?;

                CustomerLink::Create(NewCustomer {
                    email: quote.email.to_lowercase(),
                    password_hash: self.passwords.hash_password(password)?,
                    first_name: quote.first_name.clone(),
                    last_name: quote.last_name.clone(),
                    phone: quote.phone.clone(),
                    email_verified: true,
                    verification_token: None,
                })
            }
            None => CustomerLink::None,
        };

        let booking = NewBooking {
            vehicle_id: request.vehicle_id,
            driver_id: request.driver_id,
            customer_name: quote.full_name(),
            customer_email: quote.email.clone(),
            customer_phone: quote.phone.clone(),
            event_date: quote.event_date,
            pickup_time,
            pickup_location: optional_text(request.pickup_location).or(quote.pickup_location.clone()),
            dropoff_location: optional_text(request.dropoff_location).or(quote.dropoff_location.clone()),
            passenger_count: quote.passenger_count,
            total_price,
            notes: optional_text(request.notes),
        };

        let converted = self
            .repos
            .bookings
            .create_from_quote(QuoteConversion {
                quote_id,
                customer,
                booking,
                now: Utc::now(),
            })
            .await?;

        tracing::info!(
            "📅 Reserva {} creada desde la cotización {}",
            converted.booking.booking_number,
            converted.quote.quote_number
        );

        let notifications = if request.send_confirmation.unwrap_or(true) {
            Some(BookingNotifications {
                customer_email: self.notifier.booking_confirmed(&converted.booking).await,
            })
        } else {
            None
        };

        Ok(CreateBookingResponse {
            success: true,
            customer_id: converted.booking.customer_id,
            account_created: converted.created_customer.is_some(),
            booking: converted.booking,
            notifications,
        })
    }

    pub async fn list(&self, filters: BookingFilters) -> AppResult<Vec<Booking>> {
        self.repos.bookings.list(&filters).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<BookingDetail> {
        let booking = self.find(id).await?;
        let invoices = self.repos.invoices.list_by_booking(id).await?;

        Ok(BookingDetail {
            balance_due: booking.balance_due(),
            booking,
            invoices,
        })
    }

    pub async fn update(&self, id: Uuid, request: UpdateBookingRequest) -> AppResult<Booking> {
        let booking = self.find(id).await?;
        let mut changes = BookingChanges {
            notes: request.notes,
            ..BookingChanges::default()
        };

        if let Some(next) = request.status {
            if !booking.status.can_transition_to(next) {
                return Err(AppError::BadRequest(format!(
                    "Cannot change booking status from {} to {}",
                    booking.status.as_str(),
                    next.as_str()
                )));
            }
            changes.status = Some(next);
        }

        if let Some(paid) = request.paid_amount {
            let paid = validate_money("paidAmount", paid)?;
            if paid > booking.total_price {
                return Err(AppError::BadRequest(
                    "paidAmount cannot exceed totalPrice".to_string(),
                ));
            }
            changes.paid_amount = Some(paid);
        }

        if let Some(pickup_time) = request.pickup_time {
            validate_time(&pickup_time).map_err(|e| field_error("pickupTime", e))?;
            changes.pickup_time = Some(pickup_time);
        }

        let updated = self.repos.bookings.update(id, changes).await?;
        tracing::info!("✏️ Reserva {} actualizada", updated.booking_number);
        Ok(updated)
    }

    /// Asignar chofer y/o vehículo a una reserva confirmada
    pub async fn assign(&self, id: Uuid, request: AssignBookingRequest) -> AppResult<Booking> {
        if request.driver_id.is_none() && request.vehicle_id.is_none() {
            return Err(AppError::BadRequest(
                "driverId or vehicleId is required".to_string(),
            ));
        }

        let booking = self.find(id).await?;
        if booking.status != BookingStatus::Confirmed {
            return Err(AppError::BadRequest(
                "Only confirmed bookings can be assigned".to_string(),
            ));
        }

        if let Some(driver_id) = request.driver_id {
            let driver = self
                .repos
                .drivers
                .find_by_id(driver_id)
                .await?
                .ok_or_else(|| not_found_error("Driver", &driver_id.to_string()))?;
            if !driver.is_active {
                return Err(AppError::BadRequest("Driver is not active".to_string()));
            }
        }

        if let Some(vehicle_id) = request.vehicle_id {
            let details = self
                .repos
                .vehicles
                .find_by_id(vehicle_id)
                .await?
                .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;
            if !details.vehicle.is_active {
                return Err(AppError::BadRequest("Vehicle is not active".to_string()));
            }
        }

        let updated = self
            .repos
            .bookings
            .update(
                id,
                BookingChanges {
                    driver_id: request.driver_id,
                    vehicle_id: request.vehicle_id,
                    ..BookingChanges::default()
                },
            )
            .await?;

        tracing::info!("🚘 Reserva {} asignada", updated.booking_number);
        Ok(updated)
    }

    async fn find(&self, id: Uuid) -> AppResult<Booking> {
        self.repos
            .bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &id.to_string()))
    }
}
