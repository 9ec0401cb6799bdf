//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación
//! y generación de números de referencia.

pub mod errors;
pub mod numbers;
pub mod validation;
