use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::customer_repository::insert_customer;
use crate::models::{Booking, BookingChanges, BookingFilters, BookingStatus, Quote};
use crate::repositories::{BookingRepository, ConvertedQuote, CustomerLink, QuoteConversion};
use crate::utils::errors::{map_db_error, not_found_error, violated_constraint, AppError, AppResult};
use crate::utils::numbers::{generate_number, NumberKind, MAX_NUMBER_ATTEMPTS};

/// Índice único que garantiza una sola reserva por cotización
const QUOTE_ID_CONSTRAINT: &str = "bookings_quote_id_key";

pub const DUPLICATE_BOOKING: &str = "A booking already exists for this quote";

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create_from_quote(&self, conversion: QuoteConversion) -> AppResult<ConvertedQuote> {
        let mut tx = self.pool.begin().await?;

        // Bloquear la cotización serializa conversiones concurrentes
        let quote = sqlx::query_as::<_, Quote>("SELECT * FROM quotes WHERE id = $1 FOR UPDATE")
            .bind(conversion.quote_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found_error("Quote", &conversion.quote_id.to_string()))?;

        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM bookings WHERE quote_id = $1")
            .bind(quote.id)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(AppError::BadRequest(DUPLICATE_BOOKING.to_string()));
        }

        let mut created_customer = None;
        let customer_id = match &conversion.customer {
            CustomerLink::Existing(id) => Some(*id),
            CustomerLink::Create(new_customer) => {
                let customer = insert_customer(&mut tx, new_customer).await?;
                let id = customer.id;
                created_customer = Some(customer);
                Some(id)
            }
            CustomerLink::None => None,
        };

        let new = &conversion.booking;
        let booking_id = Uuid::new_v4();
        let mut booking = None;

        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let number = generate_number(NumberKind::Booking, Utc::now());

            let inserted = sqlx::query_as::<_, Booking>(
                r#"
                INSERT INTO bookings (
                    id, booking_number, quote_id, customer_id, vehicle_id, driver_id,
                    status, customer_name, customer_email, customer_phone, event_date,
                    pickup_time, pickup_location, dropoff_location, passenger_count,
                    total_price, paid_amount, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6, 'CONFIRMED', $7, $8, $9, $10, $11, $12, $13, $14, $15, 0, $16)
                ON CONFLICT (booking_number) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(booking_id)
            .bind(&number)
            .bind(quote.id)
            .bind(customer_id)
            .bind(new.vehicle_id)
            .bind(new.driver_id)
            .bind(&new.customer_name)
            .bind(&new.customer_email)
            .bind(&new.customer_phone)
            .bind(new.event_date)
            .bind(&new.pickup_time)
            .bind(&new.pickup_location)
            .bind(&new.dropoff_location)
            .bind(new.passenger_count)
            .bind(new.total_price)
            .bind(&new.notes)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                if violated_constraint(&e).as_deref() == Some(QUOTE_ID_CONSTRAINT) {
                    AppError::BadRequest(DUPLICATE_BOOKING.to_string())
                } else {
                    map_db_error(e, DUPLICATE_BOOKING)
                }
            })?;

            if inserted.is_some() {
                booking = inserted;
                break;
            }
            tracing::warn!("🔁 Colisión de número de reserva {} (intento {})", number, attempt);
        }

        let booking = booking.ok_or_else(|| {
            AppError::Internal("Could not generate a unique booking number".to_string())
        })?;

        let quote = sqlx::query_as::<_, Quote>(
            r#"
            UPDATE quotes SET
                status = 'ACCEPTED',
                customer_id = COALESCE(customer_id, $2),
                responded_at = COALESCE(responded_at, $3),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(quote.id)
        .bind(customer_id)
        .bind(conversion.now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ConvertedQuote {
            booking,
            quote,
            created_customer,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn find_by_quote(&self, quote_id: Uuid) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE quote_id = $1")
            .bind(quote_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn list(&self, filters: &BookingFilters) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE ($1::booking_status IS NULL OR status = $1)
            ORDER BY event_date DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filters.status)
        .bind(filters.limit)
        .bind(filters.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE customer_id = $1 ORDER BY event_date DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn update(&self, id: Uuid, changes: BookingChanges) -> AppResult<Booking> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings SET
                status = COALESCE($2, status),
                paid_amount = COALESCE($3, paid_amount),
                pickup_time = COALESCE($4, pickup_time),
                notes = COALESCE($5, notes),
                driver_id = COALESCE($6, driver_id),
                vehicle_id = COALESCE($7, vehicle_id),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.status)
        .bind(changes.paid_amount)
        .bind(changes.pickup_time)
        .bind(changes.notes)
        .bind(changes.driver_id)
        .bind(changes.vehicle_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Booking update conflicts with existing data"))?
        .ok_or_else(|| not_found_error("Booking", &id.to_string()))?;

        Ok(booking)
    }

    async fn count_by_driver(&self, driver_id: Uuid) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE driver_id = $1")
            .bind(driver_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE vehicle_id = $1")
            .bind(vehicle_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_by_status(&self) -> AppResult<Vec<(BookingStatus, i64)>> {
        let counts = sqlx::query_as::<_, (BookingStatus, i64)>(
            "SELECT status, COUNT(*) FROM bookings GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }
}
