use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{NewVehicle, NewVehicleImage, Vehicle, VehicleChanges, VehicleDetails, VehicleImage};
use crate::repositories::VehicleRepository;
use crate::utils::errors::{map_db_error, not_found_error, AppResult};

const SLUG_TAKEN: &str = "A vehicle with this slug already exists";

pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_images(&self, vehicle: Vehicle) -> AppResult<VehicleDetails> {
        let images = sqlx::query_as::<_, VehicleImage>(
            "SELECT * FROM vehicle_images WHERE vehicle_id = $1 ORDER BY position",
        )
        .bind(vehicle.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(VehicleDetails { vehicle, images })
    }
}

/// Reemplaza la lista de imágenes; la posición es el índice en `images`
async fn replace_images(
    conn: &mut PgConnection,
    vehicle_id: Uuid,
    images: &[NewVehicleImage],
) -> AppResult<Vec<VehicleImage>> {
    sqlx::query("DELETE FROM vehicle_images WHERE vehicle_id = $1")
        .bind(vehicle_id)
        .execute(&mut *conn)
        .await?;

    let mut stored = Vec::with_capacity(images.len());
    for (position, image) in images.iter().enumerate() {
        let row = sqlx::query_as::<_, VehicleImage>(
            r#"
            INSERT INTO vehicle_images (id, vehicle_id, url, alt_text, position)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(vehicle_id)
        .bind(&image.url)
        .bind(&image.alt_text)
        .bind(position as i32)
        .fetch_one(&mut *conn)
        .await?;
        stored.push(row);
    }

    Ok(stored)
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn create(&self, vehicle: NewVehicle) -> AppResult<VehicleDetails> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (
                id, slug, name, category, description, capacity, hourly_rate,
                minimum_hours, features, amenities, is_active, is_featured
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&vehicle.slug)
        .bind(&vehicle.name)
        .bind(&vehicle.category)
        .bind(&vehicle.description)
        .bind(vehicle.capacity)
        .bind(vehicle.hourly_rate)
        .bind(vehicle.minimum_hours)
        .bind(&vehicle.features)
        .bind(&vehicle.amenities)
        .bind(vehicle.is_active)
        .bind(vehicle.is_featured)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error(e, SLUG_TAKEN))?;

        let images = replace_images(&mut tx, created.id, &vehicle.images).await?;
        tx.commit().await?;

        Ok(VehicleDetails {
            vehicle: created,
            images,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<VehicleDetails>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match vehicle {
            Some(vehicle) => Ok(Some(self.with_images(vehicle).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<VehicleDetails>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        match vehicle {
            Some(vehicle) => Ok(Some(self.with_images(vehicle).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self, active_only: bool) -> AppResult<Vec<VehicleDetails>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE ($1 = FALSE OR is_active)
            ORDER BY is_featured DESC, name
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = vehicles.iter().map(|v| v.id).collect();
        let images = sqlx::query_as::<_, VehicleImage>(
            "SELECT * FROM vehicle_images WHERE vehicle_id = ANY($1) ORDER BY vehicle_id, position",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_vehicle: HashMap<Uuid, Vec<VehicleImage>> = HashMap::new();
        for image in images {
            by_vehicle.entry(image.vehicle_id).or_default().push(image);
        }

        Ok(vehicles
            .into_iter()
            .map(|vehicle| {
                let images = by_vehicle.remove(&vehicle.id).unwrap_or_default();
                VehicleDetails { vehicle, images }
            })
            .collect())
    }

    async fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> AppResult<bool> {
        let (taken,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn update(&self, id: Uuid, changes: VehicleChanges) -> AppResult<VehicleDetails> {
        let mut tx = self.pool.begin().await?;

        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles SET
                slug = COALESCE($2, slug),
                name = COALESCE($3, name),
                category = COALESCE($4, category),
                description = COALESCE($5, description),
                capacity = COALESCE($6, capacity),
                hourly_rate = COALESCE($7, hourly_rate),
                minimum_hours = COALESCE($8, minimum_hours),
                features = COALESCE($9, features),
                amenities = COALESCE($10, amenities),
                is_active = COALESCE($11, is_active),
                is_featured = COALESCE($12, is_featured),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.slug)
        .bind(changes.name)
        .bind(changes.category)
        .bind(changes.description)
        .bind(changes.capacity)
        .bind(changes.hourly_rate)
        .bind(changes.minimum_hours)
        .bind(changes.features)
        .bind(changes.amenities)
        .bind(changes.is_active)
        .bind(changes.is_featured)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error(e, SLUG_TAKEN))?
        .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        let images = match changes.images {
            Some(images) => replace_images(&mut tx, id, &images).await?,
            None => {
                sqlx::query_as::<_, VehicleImage>(
                    "SELECT * FROM vehicle_images WHERE vehicle_id = $1 ORDER BY position",
                )
                .bind(id)
                .fetch_all(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(VehicleDetails { vehicle, images })
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        // Las imágenes se borran en cascada
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, SLUG_TAKEN))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Vehicle", &id.to_string()));
        }
        Ok(())
    }
}
