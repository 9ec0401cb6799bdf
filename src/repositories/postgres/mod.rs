//! Implementaciones PostgreSQL de los repositorios

mod admin_repository;
mod booking_repository;
mod customer_repository;
mod driver_repository;
mod invoice_repository;
mod promo_code_repository;
mod quote_repository;
mod vehicle_repository;

pub use admin_repository::PgAdminRepository;
pub use booking_repository::PgBookingRepository;
pub use customer_repository::PgCustomerRepository;
pub use driver_repository::PgDriverRepository;
pub use invoice_repository::PgInvoiceRepository;
pub use promo_code_repository::PgPromoCodeRepository;
pub use quote_repository::PgQuoteRepository;
pub use vehicle_repository::PgVehicleRepository;
