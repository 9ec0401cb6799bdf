use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::NewVehicleImage;

// Request para crear un vehículo
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    pub hourly_rate: Option<Decimal>,
    #[validate(range(min = 1))]
    pub minimum_hours: Option<i32>,
    pub features: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub images: Option<Vec<NewVehicleImage>>,
}

// Request para actualizar un vehículo; `images` reemplaza la lista completa
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    pub hourly_rate: Option<Decimal>,
    #[validate(range(min = 1))]
    pub minimum_hours: Option<i32>,
    pub features: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub images: Option<Vec<NewVehicleImage>>,
}
