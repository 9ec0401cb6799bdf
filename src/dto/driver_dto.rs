use serde::Deserialize;
use validator::Validate;

// Request para crear un chofer
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDriverRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub license_expiry: Option<String>,
    pub hire_date: Option<String>,
    pub employment_type: Option<String>,
    pub notes: Option<String>,
}

// Request para actualizar un chofer
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDriverRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub license_expiry: Option<String>,
    pub hire_date: Option<String>,
    pub employment_type: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}
