use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Invoice, InvoiceChanges, InvoiceFilters, NewInvoice};
use crate::repositories::InvoiceRepository;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::numbers::{generate_number, NumberKind, MAX_NUMBER_ATTEMPTS};

pub const PROMO_EXHAUSTED: &str = "Promo code has reached its usage limit";

pub struct PgInvoiceRepository {
    pool: PgPool,
}

impl PgInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceRepository for PgInvoiceRepository {
    async fn create(&self, invoice: NewInvoice) -> AppResult<Invoice> {
        let mut tx = self.pool.begin().await?;

        if let Some(promo_code_id) = invoice.promo_code_id {
            // Incremento condicional: si el límite ya se alcanzó no se factura
            let redeemed = sqlx::query(
                r#"
                UPDATE promo_codes SET usage_count = usage_count + 1, updated_at = now()
                WHERE id = $1 AND (usage_limit IS NULL OR usage_count < usage_limit)
                "#,
            )
            .bind(promo_code_id)
            .execute(&mut *tx)
            .await?;

            if redeemed.rows_affected() == 0 {
                return Err(AppError::Conflict(PROMO_EXHAUSTED.to_string()));
            }
        }

        let id = Uuid::new_v4();
        let totals = invoice.totals;
        let mut created = None;

        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let number = generate_number(NumberKind::Invoice, Utc::now());

            let inserted = sqlx::query_as::<_, Invoice>(
                r#"
                INSERT INTO invoices (
                    id, invoice_number, booking_id, customer_id, promo_code_id,
                    subtotal, promo_discount, tax, total, payment_status,
                    payment_method, due_date, paid_at, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                ON CONFLICT (invoice_number) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&number)
            .bind(invoice.booking_id)
            .bind(invoice.customer_id)
            .bind(invoice.promo_code_id)
            .bind(totals.subtotal)
            .bind(totals.promo_discount)
            .bind(totals.tax)
            .bind(totals.total)
            .bind(invoice.payment_status)
            .bind(&invoice.payment_method)
            .bind(invoice.due_date)
            .bind(invoice.paid_at)
            .bind(&invoice.notes)
            .fetch_optional(&mut *tx)
            .await?;

            if inserted.is_some() {
                created = inserted;
                break;
            }
            tracing::warn!("🔁 Colisión de número de factura {} (intento {})", number, attempt);
        }

        let created = created.ok_or_else(|| {
            AppError::Internal("Could not generate a unique invoice number".to_string())
        })?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invoice)
    }

    async fn list(&self, filters: &InvoiceFilters) -> AppResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT * FROM invoices
            WHERE ($1::payment_status IS NULL OR payment_status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filters.payment_status)
        .bind(filters.limit)
        .bind(filters.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE customer_id = $1 ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    async fn list_by_booking(&self, booking_id: Uuid) -> AppResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE booking_id = $1 ORDER BY created_at",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    async fn update(&self, id: Uuid, changes: InvoiceChanges) -> AppResult<Invoice> {
        // paid_at: None = sin cambio, Some(None) = limpiar, Some(Some(t)) = fijar
        let (set_paid_at, paid_at) = match changes.paid_at {
            Some(value) => (true, value),
            None => (false, None),
        };

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices SET
                payment_status = COALESCE($2, payment_status),
                payment_method = COALESCE($3, payment_method),
                due_date = COALESCE($4, due_date),
                notes = COALESCE($5, notes),
                paid_at = CASE WHEN $6 THEN $7 ELSE paid_at END,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.payment_status)
        .bind(changes.payment_method)
        .bind(changes.due_date)
        .bind(changes.notes)
        .bind(set_paid_at)
        .bind(paid_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Invoice", &id.to_string()))?;

        Ok(invoice)
    }

    async fn count_by_promo_code(&self, promo_code_id: Uuid) -> AppResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM invoices WHERE promo_code_id = $1")
                .bind(promo_code_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn outstanding_total(&self) -> AppResult<Decimal> {
        let (total,): (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(SUM(total), 0) FROM invoices WHERE payment_status <> 'PAID'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}
