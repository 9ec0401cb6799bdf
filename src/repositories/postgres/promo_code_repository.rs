use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewPromoCode, PromoCode, PromoCodeChanges};
use crate::repositories::PromoCodeRepository;
use crate::utils::errors::{map_db_error, not_found_error, AppError, AppResult};

pub struct PgPromoCodeRepository {
    pool: PgPool,
}

impl PgPromoCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PromoCodeRepository for PgPromoCodeRepository {
    async fn create(&self, promo: NewPromoCode) -> AppResult<PromoCode> {
        let created = sqlx::query_as::<_, PromoCode>(
            r#"
            INSERT INTO promo_codes (
                id, code, description, discount_type, discount_value,
                min_booking_amount, max_discount, usage_limit, usage_count,
                valid_from, valid_until, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&promo.code)
        .bind(&promo.description)
        .bind(promo.discount_type)
        .bind(promo.discount_value)
        .bind(promo.min_booking_amount)
        .bind(promo.max_discount)
        .bind(promo.usage_limit)
        .bind(promo.valid_from)
        .bind(promo.valid_until)
        .bind(promo.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, &format!("Promo code '{}' already exists", promo.code)))?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<PromoCode>> {
        let promo = sqlx::query_as::<_, PromoCode>("SELECT * FROM promo_codes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(promo)
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<PromoCode>> {
        let promo = sqlx::query_as::<_, PromoCode>("SELECT * FROM promo_codes WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(promo)
    }

    async fn list(&self) -> AppResult<Vec<PromoCode>> {
        let promos = sqlx::query_as::<_, PromoCode>("SELECT * FROM promo_codes ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(promos)
    }

    async fn update(&self, id: Uuid, changes: PromoCodeChanges) -> AppResult<PromoCode> {
        let promo = sqlx::query_as::<_, PromoCode>(
            r#"
            UPDATE promo_codes SET
                description = COALESCE($2, description),
                discount_type = COALESCE($3, discount_type),
                discount_value = COALESCE($4, discount_value),
                min_booking_amount = COALESCE($5, min_booking_amount),
                max_discount = COALESCE($6, max_discount),
                usage_limit = COALESCE($7, usage_limit),
                valid_from = COALESCE($8, valid_from),
                valid_until = COALESCE($9, valid_until),
                is_active = COALESCE($10, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.description)
        .bind(changes.discount_type)
        .bind(changes.discount_value)
        .bind(changes.min_booking_amount)
        .bind(changes.max_discount)
        .bind(changes.usage_limit)
        .bind(changes.valid_from)
        .bind(changes.valid_until)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match &e {
            // CHECK de ventana o de límite de usos
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23514") => {
                AppError::BadRequest("Promo code update violates its constraints".to_string())
            }
            _ => map_db_error(e, "Promo code already exists"),
        })?
        .ok_or_else(|| not_found_error("Promo code", &id.to_string()))?;

        Ok(promo)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM promo_codes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Promo code is referenced by invoices"))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Promo code", &id.to_string()));
        }
        Ok(())
    }
}
