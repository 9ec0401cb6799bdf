//! Middleware del sistema
//!
//! Este módulo contiene los extractores de sesión, la guardia de las
//! páginas de administración y la configuración de CORS.

pub mod auth;
pub mod cors;
pub mod guard;

pub use auth::*;
pub use cors::*;
pub use guard::*;
