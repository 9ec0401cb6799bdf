//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Las variables obligatorias se validan al arrancar: si falta `JWT_SECRET` el
//! proceso no inicia.

use std::env;
use thiserror::Error;

/// Longitud mínima aceptada para el secreto de firma JWT
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Errores de configuración detectados al arrancar
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub cron_secret: Option<String>,
    pub cors_origins: Vec<String>,
    pub bcrypt_cost: u32,
    pub public_base_url: String,
    pub business_email: String,
    pub business_phone: Option<String>,
    pub email: EmailProviderConfig,
    pub sms: Option<SmsProviderConfig>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Proveedor HTTP de email transaccional
#[derive(Debug, Clone)]
pub struct EmailProviderConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
}

/// Proveedor de SMS (API estilo Twilio)
#[derive(Debug, Clone)]
pub struct SmsProviderConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from: String,
    pub api_base: String,
}

/// Administrador creado al arrancar si aún no existe
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl EnvironmentConfig {
    /// Cargar la configuración desde variables de entorno
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: format!("must be at least {} bytes", MIN_JWT_SECRET_LENGTH),
            });
        }

        let port = optional("PORT")
            .map(|p| {
                p.parse::<u16>().map_err(|e| ConfigError::Invalid {
                    name: "PORT",
                    reason: e.to_string(),
                })
            })
            .transpose()?
            .unwrap_or(3000);

        let bcrypt_cost = optional("BCRYPT_COST")
            .map(|c| {
                c.parse::<u32>().map_err(|e| ConfigError::Invalid {
                    name: "BCRYPT_COST",
                    reason: e.to_string(),
                })
            })
            .transpose()?
            .unwrap_or(bcrypt::DEFAULT_COST);

        let sms = match (
            optional("SMS_ACCOUNT_SID"),
            optional("SMS_AUTH_TOKEN"),
            optional("SMS_FROM"),
        ) {
            (Some(account_sid), Some(auth_token), Some(from)) => Some(SmsProviderConfig {
                account_sid,
                auth_token,
                from,
                api_base: optional("SMS_API_BASE")
                    .unwrap_or_else(|| "https://api.twilio.com".to_string()),
            }),
            _ => None,
        };

        let bootstrap_admin = match (optional("ADMIN_EMAIL"), optional("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                email,
                password,
                name: optional("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            environment: optional("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            port,
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            database_url: required("DATABASE_URL")?,
            jwt_secret,
            cron_secret: optional("CRON_SECRET"),
            cors_origins: optional("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            bcrypt_cost,
            public_base_url: optional("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            business_email: required("BUSINESS_EMAIL")?,
            business_phone: optional("BUSINESS_PHONE"),
            email: EmailProviderConfig {
                api_url: optional("EMAIL_API_URL"),
                api_key: optional("EMAIL_API_KEY"),
                from: optional("EMAIL_FROM")
                    .unwrap_or_else(|| "reservations@localhost".to_string()),
            },
            sms,
            bootstrap_admin,
        })
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
