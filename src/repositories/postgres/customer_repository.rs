use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Customer, CustomerProfileChanges, NewCustomer};
use crate::repositories::CustomerRepository;
use crate::utils::errors::{map_db_error, not_found_error, AppResult};

pub const EMAIL_TAKEN: &str = "An account with this email already exists";

pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Insertar un cliente sobre una conexión dada (pool o transacción)
pub(super) async fn insert_customer(
    conn: &mut PgConnection,
    customer: &NewCustomer,
) -> AppResult<Customer> {
    let created = sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (
            id, email, password_hash, first_name, last_name, phone,
            email_verified, verification_token
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&customer.email)
    .bind(&customer.password_hash)
    .bind(&customer.first_name)
    .bind(&customer.last_name)
    .bind(&customer.phone)
    .bind(customer.email_verified)
    .bind(&customer.verification_token)
    .fetch_one(conn)
    .await
    .map_err(|e| map_db_error(e, EMAIL_TAKEN))?;

    Ok(created)
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn create(&self, customer: NewCustomer) -> AppResult<Customer> {
        let mut conn = self.pool.acquire().await?;
        insert_customer(&mut conn, &customer).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Customer>> {
        let customer =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE lower(email) = lower($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(customer)
    }

    async fn update_profile(&self, id: Uuid, changes: CustomerProfileChanges) -> AppResult<Customer> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.phone)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Customer", &id.to_string()))?;

        Ok(customer)
    }

    async fn verify_email(&self, token: &str) -> AppResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                email_verified = TRUE,
                verification_token = NULL,
                updated_at = now()
            WHERE verification_token = $1
            RETURNING *
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn set_reset_token(&self, id: Uuid, token: &str, expires_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE customers SET
                reset_token = $2,
                reset_token_expires_at = $3,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reset_password(&self, token: &str, password_hash: &str, now: DateTime<Utc>) -> AppResult<bool> {
        // Una sola sentencia: dos peticiones con el mismo token no pueden ganar ambas
        let result = sqlx::query(
            r#"
            UPDATE customers SET
                password_hash = $2,
                reset_token = NULL,
                reset_token_expires_at = NULL,
                updated_at = now()
            WHERE reset_token = $1 AND reset_token_expires_at > $3
            "#,
        )
        .bind(token)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE customers SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
