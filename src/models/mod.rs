//! Modelos de datos
//!
//! Structs que mapean las tablas de PostgreSQL y las reglas de negocio
//! que dependen solo de sus campos.

pub mod admin;
pub mod booking;
pub mod customer;
pub mod driver;
pub mod invoice;
pub mod promo_code;
pub mod quote;
pub mod vehicle;

pub use admin::*;
pub use booking::*;
pub use customer::*;
pub use driver::*;
pub use invoice::*;
pub use promo_code::*;
pub use quote::*;
pub use vehicle::*;
