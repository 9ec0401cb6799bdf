use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::models::{NewVehicle, NewVehicleImage, VehicleChanges, VehicleDetails};
use crate::repositories::Repositories;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::{
    optional_text, require, require_text, validate_money, validate_slug,
};

const SLUG_TAKEN: &str = "A vehicle with this slug already exists";

pub struct VehicleController {
    repos: Repositories,
}

impl VehicleController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repos: state.repos.clone(),
        }
    }

    pub async fn create(&self, request: CreateVehicleRequest) -> AppResult<VehicleDetails> {
        let slug = validate_slug(&require_text("slug", request.slug.as_deref())?)?;
        let name = require_text("name", request.name.as_deref())?;
        let category = require_text("category", request.category.as_deref())?;
        let capacity = require("capacity", &request.capacity)?;
        let hourly_rate = validate_money("hourlyRate", require("hourlyRate", &request.hourly_rate)?)?;
        request.validate()?;

        if self.repos.vehicles.slug_taken(&slug, None).await? {
            return Err(AppError::Conflict(SLUG_TAKEN.to_string()));
        }

        let details = self
            .repos
            .vehicles
            .create(NewVehicle {
                slug,
                name,
                category,
                description: optional_text(request.description),
                capacity,
                hourly_rate,
                minimum_hours: request.minimum_hours.unwrap_or(1),
                features: request.features.unwrap_or_default(),
                amenities: request.amenities.unwrap_or_default(),
                is_active: request.is_active.unwrap_or(true),
                is_featured: request.is_featured.unwrap_or(false),
                images: clean_images(request.images.unwrap_or_default())?,
            })
            .await?;

        tracing::info!("🚗 Vehículo {} creado", details.vehicle.slug);
        Ok(details)
    }

    pub async fn list(&self, active_only: bool) -> AppResult<Vec<VehicleDetails>> {
        self.repos.vehicles.list(active_only).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<VehicleDetails> {
        self.repos
            .vehicles
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))
    }

    /// Ficha pública: los vehículos inactivos no se exponen
    pub async fn get_public(&self, slug: &str) -> AppResult<VehicleDetails> {
        self.repos
            .vehicles
            .find_by_slug(slug)
            .await?
            .filter(|details| details.vehicle.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Vehicle '{}' not found", slug)))
    }

    pub async fn update(&self, id: Uuid, request: UpdateVehicleRequest) -> AppResult<VehicleDetails> {
        self.get(id).await?;
        request.validate()?;

        let slug = request.slug.as_deref().map(validate_slug).transpose()?;
        if let Some(slug) = slug.as_deref() {
            if self.repos.vehicles.slug_taken(slug, Some(id)).await? {
                return Err(AppError::Conflict(SLUG_TAKEN.to_string()));
            }
        }

        let hourly_rate = request
            .hourly_rate
            .map(|rate| validate_money("hourlyRate", rate))
            .transpose()?;
        let images = request.images.map(clean_images).transpose()?;

        let details = self
            .repos
            .vehicles
            .update(
                id,
                VehicleChanges {
                    slug,
                    name: optional_text(request.name),
                    category: optional_text(request.category),
                    description: request.description,
                    capacity: request.capacity,
                    hourly_rate,
                    minimum_hours: request.minimum_hours,
                    features: request.features,
                    amenities: request.amenities,
                    is_active: request.is_active,
                    is_featured: request.is_featured,
                    images,
                },
            )
            .await?;

        tracing::info!("✏️ Vehículo {} actualizado", details.vehicle.slug);
        Ok(details)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let details = self.get(id).await?;
        if self.repos.bookings.count_by_vehicle(id).await? > 0 {
            return Err(AppError::Conflict(
                "Vehicle has bookings; deactivate instead".to_string(),
            ));
        }

        self.repos.vehicles.delete(id).await?;
        tracing::info!("🗑️ Vehículo {} eliminado", details.vehicle.slug);
        Ok(())
    }
}

fn clean_images(images: Vec<NewVehicleImage>) -> AppResult<Vec<NewVehicleImage>> {
    images
        .into_iter()
        .map(|image| {
            let url = require_text("images.url", Some(&image.url))?;
            Ok(NewVehicleImage {
                url,
                alt_text: optional_text(image.alt_text),
            })
        })
        .collect()
}
