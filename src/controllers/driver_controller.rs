use uuid::Uuid;
use validator::Validate;

use crate::dto::driver_dto::{CreateDriverRequest, UpdateDriverRequest};
use crate::models::{Driver, DriverChanges, NewDriver};
use crate::repositories::Repositories;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::{field_error, optional_text, require_text, validate_date, validate_phone};

pub struct DriverController {
    repos: Repositories,
}

impl DriverController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repos: state.repos.clone(),
        }
    }

    pub async fn create(&self, request: CreateDriverRequest) -> AppResult<Driver> {
        let first_name = require_text("firstName", request.first_name.as_deref())?;
        let last_name = require_text("lastName", request.last_name.as_deref())?;
        let phone = require_text("phone", request.phone.as_deref())?;
        let license_number = require_text("licenseNumber", request.license_number.as_deref())?;

        request.validate()?;
        validate_phone(&phone).map_err(|e| field_error("phone", e))?;

        let email = optional_text(request.email).map(|e| e.to_lowercase());
        if let Some(email) = email.as_deref() {
            if self.repos.drivers.email_taken(email, None).await? {
                return Err(AppError::Conflict(
                    "A driver with this email already exists".to_string(),
                ));
            }
        }

        let driver = self
            .repos
            .drivers
            .create(NewDriver {
                first_name,
                last_name,
                email,
                phone,
                license_number,
                license_expiry: optional_date("licenseExpiry", request.license_expiry)?,
                hire_date: optional_date("hireDate", request.hire_date)?,
                employment_type: optional_text(request.employment_type),
                notes: optional_text(request.notes),
            })
            .await?;

        tracing::info!("🧑‍✈️ Chofer {} creado", driver.full_name());
        Ok(driver)
    }

    pub async fn list(&self) -> AppResult<Vec<Driver>> {
        self.repos.drivers.list().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Driver> {
        self.repos
            .drivers
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Driver", &id.to_string()))
    }

    pub async fn update(&self, id: Uuid, request: UpdateDriverRequest) -> AppResult<Driver> {
        self.get(id).await?;
        request.validate()?;

        let phone = optional_text(request.phone);
        if let Some(phone) = phone.as_deref() {
            validate_phone(phone).map_err(|e| field_error("phone", e))?;
        }

        let email = optional_text(request.email).map(|e| e.to_lowercase());
        if let Some(email) = email.as_deref() {
            if self.repos.drivers.email_taken(email, Some(id)).await? {
                return Err(AppError::Conflict(
                    "A driver with this email already exists".to_string(),
                ));
            }
        }

        self.repos
            .drivers
            .update(
                id,
                DriverChanges {
                    first_name: optional_text(request.first_name),
                    last_name: optional_text(request.last_name),
                    email,
                    phone,
                    license_number: optional_text(request.license_number),
                    license_expiry: optional_date("licenseExpiry", request.license_expiry)?,
                    hire_date: optional_date("hireDate", request.hire_date)?,
                    employment_type: optional_text(request.employment_type),
                    notes: request.notes,
                    is_active: request.is_active,
                },
            )
            .await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let driver = self.get(id).await?;
        if self.repos.bookings.count_by_driver(id).await? > 0 {
            return Err(AppError::Conflict(
                "Driver has bookings; deactivate instead".to_string(),
            ));
        }

        self.repos.drivers.delete(id).await?;
        tracing::info!("🗑️ Chofer {} eliminado", driver.full_name());
        Ok(())
    }
}

fn optional_date(field: &'static str, value: Option<String>) -> AppResult<Option<chrono::NaiveDate>> {
    optional_text(value)
        .map(|v| validate_date(&v).map_err(|e| field_error(field, e)))
        .transpose()
}
