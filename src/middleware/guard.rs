//! Guardia de acceso por prefijo de ruta
//!
//! Corre una vez por request delante de todo el router. Solo las páginas
//! `/admin` (salvo `/admin/login`) exigen sesión de administrador; la API
//! JSON se protege con los extractores de sesión.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::auth::{clear_session_cookie, session_token};
use crate::services::jwt_service::PrincipalRole;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/admin/login";

/// Estado del token de administrador presentado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Missing,
    Invalid,
    Valid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin { clear_cookie: bool },
}

/// Ruta de página de administración que exige sesión
pub fn requires_admin(path: &str) -> bool {
    if path.starts_with("/api/") || path == "/api" || path.starts_with(LOGIN_PATH) {
        return false;
    }
    path == "/admin" || path.starts_with("/admin/")
}

/// Decisión pura a partir de la ruta y del token
pub fn guard_decision(path: &str, token: TokenState) -> GuardDecision {
    if !requires_admin(path) {
        return GuardDecision::Allow;
    }
    match token {
        TokenState::Valid => GuardDecision::Allow,
        TokenState::Missing => GuardDecision::RedirectToLogin { clear_cookie: false },
        TokenState::Invalid => GuardDecision::RedirectToLogin { clear_cookie: true },
    }
}

pub async fn admin_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if !requires_admin(&path) {
        return next.run(request).await;
    }

    // Un único intento de verificación por request
    let token = match session_token(request.headers(), PrincipalRole::Admin) {
        None => TokenState::Missing,
        Some(token) if state.jwt.verify(&token, PrincipalRole::Admin).is_some() => TokenState::Valid,
        Some(_) => TokenState::Invalid,
    };

    match guard_decision(&path, token) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::RedirectToLogin { clear_cookie } => {
            tracing::debug!("🔒 Redirigiendo {} al login ({:?})", path, token);
            let mut response = Redirect::to(LOGIN_PATH).into_response();
            if clear_cookie {
                let cookie = clear_session_cookie(PrincipalRole::Admin, state.config.is_production());
                if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths_pass_through() {
        for path in ["/", "/vehicles", "/api/admin/quotes", "/api/quotes", "/administrator"] {
            assert_eq!(guard_decision(path, TokenState::Missing), GuardDecision::Allow, "{}", path);
        }
    }

    #[test]
    fn test_login_pages_are_open() {
        assert_eq!(guard_decision("/admin/login", TokenState::Missing), GuardDecision::Allow);
        assert_eq!(
            guard_decision("/admin/login/reset", TokenState::Invalid),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_admin_pages_require_token() {
        assert_eq!(
            guard_decision("/admin", TokenState::Missing),
            GuardDecision::RedirectToLogin { clear_cookie: false }
        );
        assert_eq!(
            guard_decision("/admin/quotes", TokenState::Invalid),
            GuardDecision::RedirectToLogin { clear_cookie: true }
        );
        assert_eq!(guard_decision("/admin/quotes", TokenState::Valid), GuardDecision::Allow);
    }
}
