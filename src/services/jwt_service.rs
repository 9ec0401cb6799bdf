use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};

/// Nombre de la cookie de sesión de administrador
pub const ADMIN_COOKIE: &str = "admin-token";
/// Nombre de la cookie de sesión de cliente
pub const CUSTOMER_COOKIE: &str = "customer-token";

/// Tipo de principal autenticado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalRole {
    Admin,
    Customer,
}

impl PrincipalRole {
    /// Vigencia del token: 24 horas para admin, 7 días para clientes
    pub fn token_ttl(self) -> Duration {
        match self {
            PrincipalRole::Admin => Duration::hours(24),
            PrincipalRole::Customer => Duration::days(7),
        }
    }

    pub fn cookie_name(self) -> &'static str {
        match self {
            PrincipalRole::Admin => ADMIN_COOKIE,
            PrincipalRole::Customer => CUSTOMER_COOKIE,
        }
    }
}

/// Claims del JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: PrincipalRole,
    pub iat: i64,
    pub exp: i64,
}

/// Servicio JWT
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Emitir un token firmado para el principal
    pub fn issue(&self, id: Uuid, email: &str, role: PrincipalRole) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: id,
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + role.token_ttl()).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Jwt(format!("Error generating token: {}", e)))
    }

    /// Verificar un token; `None` ante firma, expiración, formato o rol inválidos
    pub fn verify(&self, token: &str, role: PrincipalRole) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) if data.claims.role == role => Some(data.claims),
            Ok(_) => {
                tracing::debug!("Token con rol distinto al esperado ({:?})", role);
                None
            }
            Err(e) => {
                tracing::debug!("Token inválido: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-with-at-least-32-bytes!!";

    fn expired_token(service: &JwtService, role: PrincipalRole) -> String {
        let past = Utc::now() - Duration::days(10);
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "old@example.com".to_string(),
            role,
            iat: past.timestamp(),
            exp: (past + Duration::hours(1)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &service.encoding_key).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let service = JwtService::new(SECRET);
        let id = Uuid::new_v4();

        let token = service.issue(id, "admin@example.com", PrincipalRole::Admin).unwrap();
        let claims = service.verify(&token, PrincipalRole::Admin).unwrap();

        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "admin@example.com");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_customer_tokens_last_seven_days() {
        let service = JwtService::new(SECRET);
        let token = service
            .issue(Uuid::new_v4(), "c@example.com", PrincipalRole::Customer)
            .unwrap();
        let claims = service.verify(&token, PrincipalRole::Customer).unwrap();
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_role_mismatch_is_rejected() {
        let service = JwtService::new(SECRET);
        let token = service
            .issue(Uuid::new_v4(), "c@example.com", PrincipalRole::Customer)
            .unwrap();
        assert!(service.verify(&token, PrincipalRole::Admin).is_none());
    }

    #[test]
    fn test_bad_signature_expired_and_garbage() {
        let service = JwtService::new(SECRET);
        let other = JwtService::new("another-secret-with-at-least-32-bytes");

        let token = other.issue(Uuid::new_v4(), "a@example.com", PrincipalRole::Admin).unwrap();
        assert!(service.verify(&token, PrincipalRole::Admin).is_none());

        let expired = expired_token(&service, PrincipalRole::Admin);
        assert!(service.verify(&expired, PrincipalRole::Admin).is_none());

        assert!(service.verify("not.a.token", PrincipalRole::Admin).is_none());
        assert!(service.verify("", PrincipalRole::Admin).is_none());
    }
}
