use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Admin, NewAdmin};
use crate::repositories::AdminRepository;
use crate::utils::errors::{map_db_error, AppResult};

pub struct PgAdminRepository {
    pool: PgPool,
}

impl PgAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminRepository for PgAdminRepository {
    async fn create(&self, admin: NewAdmin) -> AppResult<Admin> {
        let created = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (id, email, name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&admin.email)
        .bind(&admin.name)
        .bind(&admin.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "An admin with this email already exists"))?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(admin)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(admin)
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE admins SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
