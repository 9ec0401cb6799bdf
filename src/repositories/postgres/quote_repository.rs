use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewQuote, Quote, QuoteChanges, QuoteFilters, QuoteStatus};
use crate::repositories::QuoteRepository;
use crate::utils::errors::{map_db_error, not_found_error, AppError, AppResult};
use crate::utils::numbers::{generate_number, NumberKind, MAX_NUMBER_ATTEMPTS};

pub struct PgQuoteRepository {
    pool: PgPool,
}

impl PgQuoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuoteRepository for PgQuoteRepository {
    async fn create(&self, quote: NewQuote) -> AppResult<Quote> {
        let id = Uuid::new_v4();

        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let number = generate_number(NumberKind::Quote, Utc::now());

            let inserted = sqlx::query_as::<_, Quote>(
                r#"
                INSERT INTO quotes (
                    id, quote_number, first_name, last_name, email, phone,
                    service_type, event_type, event_date, pickup_time,
                    pickup_location, dropoff_location, passenger_count,
                    vehicle_preference, special_requests, status, customer_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, 'PENDING', $16)
                ON CONFLICT (quote_number) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&number)
            .bind(&quote.first_name)
            .bind(&quote.last_name)
            .bind(&quote.email)
            .bind(&quote.phone)
            .bind(&quote.service_type)
            .bind(&quote.event_type)
            .bind(quote.event_date)
            .bind(&quote.pickup_time)
            .bind(&quote.pickup_location)
            .bind(&quote.dropoff_location)
            .bind(quote.passenger_count)
            .bind(&quote.vehicle_preference)
            .bind(&quote.special_requests)
            .bind(quote.customer_id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(created) = inserted {
                return Ok(created);
            }
            tracing::warn!("🔁 Colisión de número de cotización {} (intento {})", number, attempt);
        }

        Err(AppError::Internal(
            "Could not generate a unique quote number".to_string(),
        ))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Quote>> {
        let quote = sqlx::query_as::<_, Quote>("SELECT * FROM quotes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(quote)
    }

    async fn list(&self, filters: &QuoteFilters) -> AppResult<Vec<Quote>> {
        let quotes = sqlx::query_as::<_, Quote>(
            r#"
            SELECT * FROM quotes
            WHERE ($1::quote_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filters.status)
        .bind(filters.limit)
        .bind(filters.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(quotes)
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Quote>> {
        let quotes = sqlx::query_as::<_, Quote>(
            "SELECT * FROM quotes WHERE customer_id = $1 ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quotes)
    }

    async fn update(&self, id: Uuid, changes: QuoteChanges) -> AppResult<Quote> {
        let quote = sqlx::query_as::<_, Quote>(
            r#"
            UPDATE quotes SET
                status = COALESCE($2, status),
                quoted_price = COALESCE($3, quoted_price),
                admin_notes = COALESCE($4, admin_notes),
                responded_at = COALESCE($5, responded_at),
                customer_id = COALESCE($6, customer_id),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.status)
        .bind(changes.quoted_price)
        .bind(changes.admin_notes)
        .bind(changes.responded_at)
        .bind(changes.customer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Quote", &id.to_string()))?;

        Ok(quote)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM quotes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Quote is referenced by a booking"))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Quote", &id.to_string()));
        }
        Ok(())
    }

    async fn link_customer_by_email(&self, email: &str, customer_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE quotes SET customer_id = $2, updated_at = now()
            WHERE customer_id IS NULL AND lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .bind(customer_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_reminder_candidates(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Quote>> {
        let quotes = sqlx::query_as::<_, Quote>(
            r#"
            SELECT * FROM quotes
            WHERE status IN ('PENDING', 'REVIEWING')
              AND reminder_sent_at IS NULL
              AND created_at < $1
            ORDER BY created_at
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(quotes)
    }

    async fn claim_reminder(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE quotes SET reminder_sent_at = $2
            WHERE id = $1
              AND reminder_sent_at IS NULL
              AND status IN ('PENDING', 'REVIEWING')
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_reminder(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE quotes SET reminder_sent_at = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn count_by_status(&self) -> AppResult<Vec<(QuoteStatus, i64)>> {
        let counts = sqlx::query_as::<_, (QuoteStatus, i64)>(
            "SELECT status, COUNT(*) FROM quotes GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }
}
