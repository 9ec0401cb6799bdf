//! Repositorios
//!
//! Cada entidad expone un trait de persistencia. La implementación de
//! producción usa PostgreSQL (`postgres`); `memory` guarda todo en proceso y
//! se usa en los tests. Las operaciones de varios pasos (reserva desde
//! cotización, factura con canje de promoción, reset de contraseña) son un
//! único método para que cada implementación las haga atómicas.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::*;
use crate::utils::errors::AppResult;

pub mod memory;
pub mod postgres;

/// Cómo vincular la reserva con una cuenta de cliente
#[derive(Debug, Clone)]
pub enum CustomerLink {
    Existing(Uuid),
    Create(NewCustomer),
    None,
}

/// Conversión de cotización a reserva
#[derive(Debug, Clone)]
pub struct QuoteConversion {
    pub quote_id: Uuid,
    pub customer: CustomerLink,
    pub booking: NewBooking,
    pub now: DateTime<Utc>,
}

/// Resultado de la conversión
#[derive(Debug, Clone)]
pub struct ConvertedQuote {
    pub booking: Booking,
    pub quote: Quote,
    pub created_customer: Option<Customer>,
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn create(&self, admin: NewAdmin) -> AppResult<Admin>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Admin>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Admin>>;
    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;
}

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    /// Inserta con número `IL…` nuevo, reintentando ante colisión
    async fn create(&self, quote: NewQuote) -> AppResult<Quote>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Quote>>;
    async fn list(&self, filters: &QuoteFilters) -> AppResult<Vec<Quote>>;
    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Quote>>;
    async fn update(&self, id: Uuid, changes: QuoteChanges) -> AppResult<Quote>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    /// Vincula cotizaciones huérfanas con el mismo email a la cuenta
    async fn link_customer_by_email(&self, email: &str, customer_id: Uuid) -> AppResult<u64>;
    /// Abiertas, creadas antes de `cutoff` y sin recordatorio
    async fn find_reminder_candidates(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Quote>>;
    /// Marca atómica de `reminder_sent_at`; falso si otro barrido la tomó
    async fn claim_reminder(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool>;
    async fn release_reminder(&self, id: Uuid) -> AppResult<()>;
    async fn count_by_status(&self) -> AppResult<Vec<(QuoteStatus, i64)>>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Transacción completa: cliente opcional, reserva y cotización ACCEPTED
    async fn create_from_quote(&self, conversion: QuoteConversion) -> AppResult<ConvertedQuote>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>>;
    async fn find_by_quote(&self, quote_id: Uuid) -> AppResult<Option<Booking>>;
    async fn list(&self, filters: &BookingFilters) -> AppResult<Vec<Booking>>;
    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Booking>>;
    async fn update(&self, id: Uuid, changes: BookingChanges) -> AppResult<Booking>;
    async fn count_by_driver(&self, driver_id: Uuid) -> AppResult<i64>;
    async fn count_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<i64>;
    async fn count_by_status(&self) -> AppResult<Vec<(BookingStatus, i64)>>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn create(&self, customer: NewCustomer) -> AppResult<Customer>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Customer>>;
    /// Búsqueda sin distinguir mayúsculas
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Customer>>;
    async fn update_profile(&self, id: Uuid, changes: CustomerProfileChanges) -> AppResult<Customer>;
    /// Marca verificada la cuenta del token y lo consume
    async fn verify_email(&self, token: &str) -> AppResult<Option<Customer>>;
    async fn set_reset_token(&self, id: Uuid, token: &str, expires_at: DateTime<Utc>) -> AppResult<()>;
    /// Cambia el hash y consume el token en una sola escritura; falso si el
    /// token no existe o expiró
    async fn reset_password(&self, token: &str, password_hash: &str, now: DateTime<Utc>) -> AppResult<bool>;
    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Inserta la factura e incrementa el uso de la promoción en la misma
    /// transacción; si el límite de usos ya se alcanzó no se guarda nada
    async fn create(&self, invoice: NewInvoice) -> AppResult<Invoice>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Invoice>>;
    async fn list(&self, filters: &InvoiceFilters) -> AppResult<Vec<Invoice>>;
    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Invoice>>;
    async fn list_by_booking(&self, booking_id: Uuid) -> AppResult<Vec<Invoice>>;
    async fn update(&self, id: Uuid, changes: InvoiceChanges) -> AppResult<Invoice>;
    async fn count_by_promo_code(&self, promo_code_id: Uuid) -> AppResult<i64>;
    /// Suma de totales aún no pagados
    async fn outstanding_total(&self) -> AppResult<Decimal>;
}

#[async_trait]
pub trait PromoCodeRepository: Send + Sync {
    async fn create(&self, promo: NewPromoCode) -> AppResult<PromoCode>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<PromoCode>>;
    /// Búsqueda por código ya en mayúsculas
    async fn find_by_code(&self, code: &str) -> AppResult<Option<PromoCode>>;
    async fn list(&self) -> AppResult<Vec<PromoCode>>;
    async fn update(&self, id: Uuid, changes: PromoCodeChanges) -> AppResult<PromoCode>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait DriverRepository: Send + Sync {
    async fn create(&self, driver: NewDriver) -> AppResult<Driver>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>>;
    async fn list(&self) -> AppResult<Vec<Driver>>;
    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> AppResult<bool>;
    async fn update(&self, id: Uuid, changes: DriverChanges) -> AppResult<Driver>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn create(&self, vehicle: NewVehicle) -> AppResult<VehicleDetails>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<VehicleDetails>>;
    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<VehicleDetails>>;
    /// Destacados primero, luego por nombre
    async fn list(&self, active_only: bool) -> AppResult<Vec<VehicleDetails>>;
    async fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> AppResult<bool>;
    async fn update(&self, id: Uuid, changes: VehicleChanges) -> AppResult<VehicleDetails>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// Conjunto de repositorios inyectado en el estado de la aplicación
#[derive(Clone)]
pub struct Repositories {
    pub admins: Arc<dyn AdminRepository>,
    pub quotes: Arc<dyn QuoteRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub promo_codes: Arc<dyn PromoCodeRepository>,
    pub drivers: Arc<dyn DriverRepository>,
    pub vehicles: Arc<dyn VehicleRepository>,
}

impl Repositories {
    /// Repositorios respaldados por PostgreSQL
    pub fn postgres(pool: PgPool) -> Self {
        use postgres::*;

        Self {
            admins: Arc::new(PgAdminRepository::new(pool.clone())),
            quotes: Arc::new(PgQuoteRepository::new(pool.clone())),
            bookings: Arc::new(PgBookingRepository::new(pool.clone())),
            customers: Arc::new(PgCustomerRepository::new(pool.clone())),
            invoices: Arc::new(PgInvoiceRepository::new(pool.clone())),
            promo_codes: Arc::new(PgPromoCodeRepository::new(pool.clone())),
            drivers: Arc::new(PgDriverRepository::new(pool.clone())),
            vehicles: Arc::new(PgVehicleRepository::new(pool)),
        }
    }

    /// Repositorios en memoria que comparten un mismo almacén
    pub fn in_memory(store: memory::MemoryStore) -> Self {
        Self {
            admins: Arc::new(store.clone()),
            quotes: Arc::new(store.clone()),
            bookings: Arc::new(store.clone()),
            customers: Arc::new(store.clone()),
            invoices: Arc::new(store.clone()),
            promo_codes: Arc::new(store.clone()),
            drivers: Arc::new(store.clone()),
            vehicles: Arc::new(store),
        }
    }
}
