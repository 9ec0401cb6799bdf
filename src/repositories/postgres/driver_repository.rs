use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Driver, DriverChanges, NewDriver};
use crate::repositories::DriverRepository;
use crate::utils::errors::{map_db_error, not_found_error, AppResult};

const EMAIL_TAKEN: &str = "A driver with this email already exists";

pub struct PgDriverRepository {
    pool: PgPool,
}

impl PgDriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DriverRepository for PgDriverRepository {
    async fn create(&self, driver: NewDriver) -> AppResult<Driver> {
        let created = sqlx::query_as::<_, Driver>(
            r#"
            INSERT INTO drivers (
                id, first_name, last_name, email, phone, license_number,
                license_expiry, hire_date, employment_type, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&driver.first_name)
        .bind(&driver.last_name)
        .bind(&driver.email)
        .bind(&driver.phone)
        .bind(&driver.license_number)
        .bind(driver.license_expiry)
        .bind(driver.hire_date)
        .bind(&driver.employment_type)
        .bind(&driver.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, EMAIL_TAKEN))?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(driver)
    }

    async fn list(&self) -> AppResult<Vec<Driver>> {
        let drivers = sqlx::query_as::<_, Driver>(
            "SELECT * FROM drivers ORDER BY is_active DESC, last_name, first_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(drivers)
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> AppResult<bool> {
        let (taken,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM drivers
                WHERE lower(email) = lower($1) AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn update(&self, id: Uuid, changes: DriverChanges) -> AppResult<Driver> {
        let driver = sqlx::query_as::<_, Driver>(
            r#"
            UPDATE drivers SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                license_number = COALESCE($6, license_number),
                license_expiry = COALESCE($7, license_expiry),
                hire_date = COALESCE($8, hire_date),
                employment_type = COALESCE($9, employment_type),
                notes = COALESCE($10, notes),
                is_active = COALESCE($11, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.email)
        .bind(changes.phone)
        .bind(changes.license_number)
        .bind(changes.license_expiry)
        .bind(changes.hire_date)
        .bind(changes.employment_type)
        .bind(changes.notes)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, EMAIL_TAKEN))?
        .ok_or_else(|| not_found_error("Driver", &id.to_string()))?;

        Ok(driver)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM drivers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, EMAIL_TAKEN))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Driver", &id.to_string()));
        }
        Ok(())
    }
}
