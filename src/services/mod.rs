//! Services module
//!
//! Este módulo contiene la lógica de negocio que no pertenece a un único
//! repositorio: credenciales, tokens de sesión y el barrido de recordatorios.

pub mod jwt_service;
pub mod password_service;
pub mod reminder_service;

pub use jwt_service::*;
pub use password_service::*;
pub use reminder_service::*;
