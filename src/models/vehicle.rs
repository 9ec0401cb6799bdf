//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y sus imágenes ordenadas.
//! Las imágenes se guardan como URLs y se eliminan junto con el vehículo.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub capacity: i32,
    pub hourly_rate: Decimal,
    pub minimum_hours: i32,
    pub features: Vec<String>,
    pub amenities: Vec<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VehicleImage {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub url: String,
    pub alt_text: Option<String>,
    pub position: i32,
}

/// Vehículo con sus imágenes en orden de `position`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDetails {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub images: Vec<VehicleImage>,
}

/// Imagen enviada por el panel; la posición es el índice en la lista
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicleImage {
    pub url: String,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub slug: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub capacity: i32,
    pub hourly_rate: Decimal,
    pub minimum_hours: i32,
    pub features: Vec<String>,
    pub amenities: Vec<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub images: Vec<NewVehicleImage>,
}

#[derive(Debug, Clone, Default)]
pub struct VehicleChanges {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub capacity: Option<i32>,
    pub hourly_rate: Option<Decimal>,
    pub minimum_hours: Option<i32>,
    pub features: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    /// Reemplaza la lista completa cuando viene informada
    pub images: Option<Vec<NewVehicleImage>>,
}
