//! Middleware de autenticación JWT
//!
//! Este módulo maneja la extracción de tokens (cookie primero, luego
//! `Authorization: Bearer`), los extractores de sesión de administrador y
//! cliente, y la construcción de las cookies de sesión.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::models::{Admin, Customer};
use crate::services::jwt_service::PrincipalRole;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Administrador autenticado que se inyecta en los handlers
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub admin: Admin,
}

/// Cliente autenticado que se inyecta en los handlers
#[derive(Debug, Clone)]
pub struct CustomerSession {
    pub customer: Customer,
}

/// Token de sesión del rol indicado: cookie del rol o header Bearer
pub fn session_token(headers: &HeaderMap, role: PrincipalRole) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(role.cookie_name()) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Cookie de sesión http-only, same-site lax, `Secure` en producción
pub fn session_cookie(role: PrincipalRole, token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((role.cookie_name(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(role.token_ttl().num_seconds()))
        .build()
}

/// Cookie vacía y expirada que borra la sesión en el navegador
pub fn clear_session_cookie(role: PrincipalRole, secure: bool) -> Cookie<'static> {
    Cookie::build((role.cookie_name(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, PrincipalRole::Admin)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        let claims = state
            .jwt
            .verify(&token, PrincipalRole::Admin)
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired session".to_string()))?;

        let admin = state
            .repos
            .admins
            .find_by_id(claims.sub)
            .await?
            .filter(|admin| admin.is_active)
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired session".to_string()))?;

        Ok(AdminSession { admin })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CustomerSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, PrincipalRole::Customer)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        let claims = state
            .jwt
            .verify(&token, PrincipalRole::Customer)
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired session".to_string()))?;

        let customer = state
            .repos
            .customers
            .find_by_id(claims.sub)
            .await?
            .filter(|customer| customer.is_active)
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired session".to_string()))?;

        Ok(CustomerSession { customer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_takes_precedence_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("admin-token=from-cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));

        assert_eq!(
            session_token(&headers, PrincipalRole::Admin).as_deref(),
            Some("from-cookie")
        );
        assert_eq!(
            session_token(&headers, PrincipalRole::Customer).as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn test_missing_token() {
        let headers = HeaderMap::new();
        assert!(session_token(&headers, PrincipalRole::Admin).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie(PrincipalRole::Customer, "abc".to_string(), true).to_string();
        assert!(cookie.starts_with("customer-token=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));

        let cleared = clear_session_cookie(PrincipalRole::Admin, false).to_string();
        assert!(cleared.starts_with("admin-token="));
        assert!(cleared.contains("Max-Age=0"));
        assert!(!cleared.contains("Secure"));
    }
}
