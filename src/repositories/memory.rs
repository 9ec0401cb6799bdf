//! Almacén en memoria
//!
//! Implementa todos los repositorios sobre tablas protegidas por un único
//! `Mutex`; cada operación toma el candado completo, así que las operaciones
//! compuestas son atómicas igual que las transacciones de PostgreSQL. Replica
//! los índices únicos y las llaves foráneas del esquema que la aplicación
//! necesita observar. Se usa en los tests de integración.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::*;
use crate::repositories::*;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::numbers::{generate_number, NumberKind, MAX_NUMBER_ATTEMPTS};

#[derive(Default)]
struct Tables {
    admins: HashMap<Uuid, Admin>,
    quotes: HashMap<Uuid, Quote>,
    bookings: HashMap<Uuid, Booking>,
    customers: HashMap<Uuid, Customer>,
    invoices: HashMap<Uuid, Invoice>,
    promo_codes: HashMap<Uuid, PromoCode>,
    drivers: HashMap<Uuid, Driver>,
    vehicles: HashMap<Uuid, Vehicle>,
    vehicle_images: Vec<VehicleImage>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cambia la fecha de creación de una cotización (simula antigüedad)
    pub async fn backdate_quote(&self, id: Uuid, created_at: DateTime<Utc>) -> bool {
        let mut tables = self.tables.lock().await;
        match tables.quotes.get_mut(&id) {
            Some(quote) => {
                quote.created_at = created_at;
                true
            }
            None => false,
        }
    }

    /// Activa o desactiva una cuenta de cliente
    pub async fn set_customer_active(&self, id: Uuid, is_active: bool) -> bool {
        let mut tables = self.tables.lock().await;
        match tables.customers.get_mut(&id) {
            Some(customer) => {
                customer.is_active = is_active;
                true
            }
            None => false,
        }
    }

    /// Desactiva un administrador
    pub async fn deactivate_admin(&self, id: Uuid) -> bool {
        let mut tables = self.tables.lock().await;
        match tables.admins.get_mut(&id) {
            Some(admin) => {
                admin.is_active = false;
                true
            }
            None => false,
        }
    }

    pub async fn quote_count(&self) -> usize {
        self.tables.lock().await.quotes.len()
    }

    pub async fn booking_count(&self) -> usize {
        self.tables.lock().await.bookings.len()
    }

    pub async fn invoice_count(&self) -> usize {
        self.tables.lock().await.invoices.len()
    }
}

/// Número único dentro de un conjunto existente
fn unique_number<'a>(
    kind: NumberKind,
    existing: impl Iterator<Item = &'a String> + Clone,
) -> AppResult<String> {
    for _ in 0..MAX_NUMBER_ATTEMPTS {
        let number = generate_number(kind, Utc::now());
        if !existing.clone().any(|n| *n == number) {
            return Ok(number);
        }
    }
    Err(AppError::Internal(format!(
        "Could not generate a unique {} number",
        kind.prefix()
    )))
}

fn page<T>(mut rows: Vec<T>, limit: Option<i64>, offset: Option<i64>) -> Vec<T> {
    let offset = offset.unwrap_or(0).max(0) as usize;
    if offset >= rows.len() {
        return Vec::new();
    }
    let mut rows = rows.split_off(offset);
    if let Some(limit) = limit {
        rows.truncate(limit.max(0) as usize);
    }
    rows
}

fn customer_email_taken(tables: &Tables, email: &str) -> bool {
    tables
        .customers
        .values()
        .any(|c| c.email.eq_ignore_ascii_case(email))
}

fn insert_customer(tables: &mut Tables, new: &NewCustomer) -> AppResult<Customer> {
    if customer_email_taken(tables, &new.email) {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }
    let now = Utc::now();
    let customer = Customer {
        id: Uuid::new_v4(),
        email: new.email.clone(),
        password_hash: new.password_hash.clone(),
        first_name: new.first_name.clone(),
        last_name: new.last_name.clone(),
        phone: new.phone.clone(),
        email_verified: new.email_verified,
        verification_token: new.verification_token.clone(),
        reset_token: None,
        reset_token_expires_at: None,
        last_login_at: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    tables.customers.insert(customer.id, customer.clone());
    Ok(customer)
}

fn vehicle_details(tables: &Tables, vehicle: &Vehicle) -> VehicleDetails {
    let mut images: Vec<VehicleImage> = tables
        .vehicle_images
        .iter()
        .filter(|i| i.vehicle_id == vehicle.id)
        .cloned()
        .collect();
    images.sort_by_key(|i| i.position);
    VehicleDetails {
        vehicle: vehicle.clone(),
        images,
    }
}

fn replace_images(tables: &mut Tables, vehicle_id: Uuid, images: &[NewVehicleImage]) {
    tables.vehicle_images.retain(|i| i.vehicle_id != vehicle_id);
    for (position, image) in images.iter().enumerate() {
        tables.vehicle_images.push(VehicleImage {
            id: Uuid::new_v4(),
            vehicle_id,
            url: image.url.clone(),
            alt_text: image.alt_text.clone(),
            position: position as i32,
        });
    }
}

fn still_referenced() -> AppError {
    AppError::Conflict("The record is still referenced by other records".to_string())
}

#[async_trait]
impl AdminRepository for MemoryStore {
    async fn create(&self, admin: NewAdmin) -> AppResult<Admin> {
        let mut tables = self.tables.lock().await;
        if tables
            .admins
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(&admin.email))
        {
            return Err(AppError::Conflict(
                "An admin with this email already exists".to_string(),
            ));
        }
        let created = Admin {
            id: Uuid::new_v4(),
            email: admin.email,
            name: admin.name,
            password_hash: admin.password_hash,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
        };
        tables.admins.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Admin>> {
        Ok(self.tables.lock().await.admins.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Admin>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .admins
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(admin) = self.tables.lock().await.admins.get_mut(&id) {
            admin.last_login_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl QuoteRepository for MemoryStore {
    async fn create(&self, quote: NewQuote) -> AppResult<Quote> {
        let mut tables = self.tables.lock().await;
        let number = unique_number(
            NumberKind::Quote,
            tables.quotes.values().map(|q| &q.quote_number),
        )?;
        let now = Utc::now();
        let created = Quote {
            id: Uuid::new_v4(),
            quote_number: number,
            first_name: quote.first_name,
            last_name: quote.last_name,
            email: quote.email,
            phone: quote.phone,
            service_type: quote.service_type,
            event_type: quote.event_type,
            event_date: quote.event_date,
            pickup_time: quote.pickup_time,
            pickup_location: quote.pickup_location,
            dropoff_location: quote.dropoff_location,
            passenger_count: quote.passenger_count,
            vehicle_preference: quote.vehicle_preference,
            special_requests: quote.special_requests,
            status: QuoteStatus::Pending,
            quoted_price: None,
            admin_notes: None,
            responded_at: None,
            reminder_sent_at: None,
            customer_id: quote.customer_id,
            created_at: now,
            updated_at: now,
        };
        tables.quotes.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Quote>> {
        Ok(self.tables.lock().await.quotes.get(&id).cloned())
    }

    async fn list(&self, filters: &QuoteFilters) -> AppResult<Vec<Quote>> {
        let tables = self.tables.lock().await;
        let mut quotes: Vec<Quote> = tables
            .quotes
            .values()
            .filter(|q| filters.status.map_or(true, |s| q.status == s))
            .cloned()
            .collect();
        quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(quotes, filters.limit, filters.offset))
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Quote>> {
        let tables = self.tables.lock().await;
        let mut quotes: Vec<Quote> = tables
            .quotes
            .values()
            .filter(|q| q.customer_id == Some(customer_id))
            .cloned()
            .collect();
        quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(quotes)
    }

    async fn update(&self, id: Uuid, changes: QuoteChanges) -> AppResult<Quote> {
        let mut tables = self.tables.lock().await;
        let quote = tables
            .quotes
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Quote", &id.to_string()))?;

        if let Some(status) = changes.status {
            quote.status = status;
        }
        if let Some(price) = changes.quoted_price {
            quote.quoted_price = Some(price);
        }
        if let Some(notes) = changes.admin_notes {
            quote.admin_notes = Some(notes);
        }
        if let Some(at) = changes.responded_at {
            quote.responded_at = Some(at);
        }
        if let Some(customer_id) = changes.customer_id {
            quote.customer_id = Some(customer_id);
        }
        quote.updated_at = Utc::now();
        Ok(quote.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if !tables.quotes.contains_key(&id) {
            return Err(not_found_error("Quote", &id.to_string()));
        }
        if tables.bookings.values().any(|b| b.quote_id == Some(id)) {
            return Err(still_referenced());
        }
        tables.quotes.remove(&id);
        Ok(())
    }

    async fn link_customer_by_email(&self, email: &str, customer_id: Uuid) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let mut linked = 0;
        for quote in tables.quotes.values_mut() {
            if quote.customer_id.is_none() && quote.email.eq_ignore_ascii_case(email) {
                quote.customer_id = Some(customer_id);
                quote.updated_at = Utc::now();
                linked += 1;
            }
        }
        Ok(linked)
    }

    async fn find_reminder_candidates(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Quote>> {
        let tables = self.tables.lock().await;
        let mut quotes: Vec<Quote> = tables
            .quotes
            .values()
            .filter(|q| q.needs_reminder(cutoff))
            .cloned()
            .collect();
        quotes.sort_by_key(|q| q.created_at);
        Ok(quotes)
    }

    async fn claim_reminder(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables.quotes.get_mut(&id) {
            Some(quote) if quote.reminder_sent_at.is_none() && quote.status.is_open() => {
                quote.reminder_sent_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_reminder(&self, id: Uuid) -> AppResult<()> {
        if let Some(quote) = self.tables.lock().await.quotes.get_mut(&id) {
            quote.reminder_sent_at = None;
        }
        Ok(())
    }

    async fn count_by_status(&self) -> AppResult<Vec<(QuoteStatus, i64)>> {
        let tables = self.tables.lock().await;
        let mut counts: HashMap<QuoteStatus, i64> = HashMap::new();
        for quote in tables.quotes.values() {
            *counts.entry(quote.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_from_quote(&self, conversion: QuoteConversion) -> AppResult<ConvertedQuote> {
        let mut tables = self.tables.lock().await;

        if !tables.quotes.contains_key(&conversion.quote_id) {
            return Err(not_found_error("Quote", &conversion.quote_id.to_string()));
        }
        if tables
            .bookings
            .values()
            .any(|b| b.quote_id == Some(conversion.quote_id))
        {
            return Err(AppError::BadRequest(
                "A booking already exists for this quote".to_string(),
            ));
        }
        if let Some(vehicle_id) = conversion.booking.vehicle_id {
            if !tables.vehicles.contains_key(&vehicle_id) {
                return Err(not_found_error("Vehicle", &vehicle_id.to_string()));
            }
        }
        if let Some(driver_id) = conversion.booking.driver_id {
            if !tables.drivers.contains_key(&driver_id) {
                return Err(not_found_error("Driver", &driver_id.to_string()));
            }
        }

        let mut created_customer = None;
        let customer_id = match &conversion.customer {
            CustomerLink::Existing(id) => Some(*id),
            CustomerLink::Create(new_customer) => {
                let customer = insert_customer(&mut tables, new_customer)?;
                let id = customer.id;
                created_customer = Some(customer);
                Some(id)
            }
            CustomerLink::None => None,
        };

        let number = unique_number(
            NumberKind::Booking,
            tables.bookings.values().map(|b| &b.booking_number),
        )?;
        let new = conversion.booking;
        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            booking_number: number,
            quote_id: Some(conversion.quote_id),
            customer_id,
            vehicle_id: new.vehicle_id,
            driver_id: new.driver_id,
            status: BookingStatus::Confirmed,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            event_date: new.event_date,
            pickup_time: new.pickup_time,
            pickup_location: new.pickup_location,
            dropoff_location: new.dropoff_location,
            passenger_count: new.passenger_count,
            total_price: new.total_price,
            paid_amount: Decimal::ZERO,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };
        tables.bookings.insert(booking.id, booking.clone());

        let quote = tables
            .quotes
            .get_mut(&conversion.quote_id)
            .ok_or_else(|| not_found_error("Quote", &conversion.quote_id.to_string()))?;
        quote.status = QuoteStatus::Accepted;
        if quote.customer_id.is_none() {
            quote.customer_id = customer_id;
        }
        if quote.responded_at.is_none() {
            quote.responded_at = Some(conversion.now);
        }
        quote.updated_at = now;
        let quote = quote.clone();

        Ok(ConvertedQuote {
            booking,
            quote,
            created_customer,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.tables.lock().await.bookings.get(&id).cloned())
    }

    async fn find_by_quote(&self, quote_id: Uuid) -> AppResult<Option<Booking>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bookings
            .values()
            .find(|b| b.quote_id == Some(quote_id))
            .cloned())
    }

    async fn list(&self, filters: &BookingFilters) -> AppResult<Vec<Booking>> {
        let tables = self.tables.lock().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| filters.status.map_or(true, |s| b.status == s))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| {
            b.event_date
                .cmp(&a.event_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(page(bookings, filters.limit, filters.offset))
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Booking>> {
        let tables = self.tables.lock().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| b.customer_id == Some(customer_id))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.event_date.cmp(&a.event_date));
        Ok(bookings)
    }

    async fn update(&self, id: Uuid, changes: BookingChanges) -> AppResult<Booking> {
        let mut tables = self.tables.lock().await;
        if let Some(driver_id) = changes.driver_id {
            if !tables.drivers.contains_key(&driver_id) {
                return Err(still_referenced());
            }
        }
        if let Some(vehicle_id) = changes.vehicle_id {
            if !tables.vehicles.contains_key(&vehicle_id) {
                return Err(still_referenced());
            }
        }

        let booking = tables
            .bookings
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Booking", &id.to_string()))?;

        if let Some(status) = changes.status {
            booking.status = status;
        }
        if let Some(paid) = changes.paid_amount {
            booking.paid_amount = paid;
        }
        if let Some(pickup_time) = changes.pickup_time {
            booking.pickup_time = pickup_time;
        }
        if let Some(notes) = changes.notes {
            booking.notes = Some(notes);
        }
        if let Some(driver_id) = changes.driver_id {
            booking.driver_id = Some(driver_id);
        }
        if let Some(vehicle_id) = changes.vehicle_id {
            booking.vehicle_id = Some(vehicle_id);
        }
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn count_by_driver(&self, driver_id: Uuid) -> AppResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bookings
            .values()
            .filter(|b| b.driver_id == Some(driver_id))
            .count() as i64)
    }

    async fn count_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bookings
            .values()
            .filter(|b| b.vehicle_id == Some(vehicle_id))
            .count() as i64)
    }

    async fn count_by_status(&self) -> AppResult<Vec<(BookingStatus, i64)>> {
        let tables = self.tables.lock().await;
        let mut counts: HashMap<BookingStatus, i64> = HashMap::new();
        for booking in tables.bookings.values() {
            *counts.entry(booking.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn create(&self, customer: NewCustomer) -> AppResult<Customer> {
        let mut tables = self.tables.lock().await;
        insert_customer(&mut tables, &customer)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Customer>> {
        Ok(self.tables.lock().await.customers.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Customer>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .customers
            .values()
            .find(|c| c.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_profile(&self, id: Uuid, changes: CustomerProfileChanges) -> AppResult<Customer> {
        let mut tables = self.tables.lock().await;
        let customer = tables
            .customers
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Customer", &id.to_string()))?;

        if let Some(first_name) = changes.first_name {
            customer.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            customer.last_name = last_name;
        }
        if let Some(phone) = changes.phone {
            customer.phone = phone;
        }
        customer.updated_at = Utc::now();
        Ok(customer.clone())
    }

    async fn verify_email(&self, token: &str) -> AppResult<Option<Customer>> {
        let mut tables = self.tables.lock().await;
        let customer = tables
            .customers
            .values_mut()
            .find(|c| c.verification_token.as_deref() == Some(token));

        Ok(customer.map(|customer| {
            customer.email_verified = true;
            customer.verification_token = None;
            customer.updated_at = Utc::now();
            customer.clone()
        }))
    }

    async fn set_reset_token(&self, id: Uuid, token: &str, expires_at: DateTime<Utc>) -> AppResult<()> {
        if let Some(customer) = self.tables.lock().await.customers.get_mut(&id) {
            customer.reset_token = Some(token.to_string());
            customer.reset_token_expires_at = Some(expires_at);
            customer.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn reset_password(&self, token: &str, password_hash: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        let customer = tables.customers.values_mut().find(|c| {
            c.reset_token.as_deref() == Some(token)
                && c.reset_token_expires_at.map_or(false, |expires| expires > now)
        });

        match customer {
            Some(customer) => {
                customer.password_hash = password_hash.to_string();
                customer.reset_token = None;
                customer.reset_token_expires_at = None;
                customer.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(customer) = self.tables.lock().await.customers.get_mut(&id) {
            customer.last_login_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl InvoiceRepository for MemoryStore {
    async fn create(&self, invoice: NewInvoice) -> AppResult<Invoice> {
        let mut tables = self.tables.lock().await;

        if !tables.bookings.contains_key(&invoice.booking_id)
            || !tables.customers.contains_key(&invoice.customer_id)
        {
            return Err(still_referenced());
        }

        // Validar el canje antes de cualquier escritura
        if let Some(promo_id) = invoice.promo_code_id {
            let promo = tables
                .promo_codes
                .get(&promo_id)
                .ok_or_else(|| not_found_error("Promo code", &promo_id.to_string()))?;
            if matches!(promo.usage_limit, Some(limit) if promo.usage_count >= limit) {
                return Err(AppError::Conflict(
                    "Promo code has reached its usage limit".to_string(),
                ));
            }
        }

        let number = unique_number(
            NumberKind::Invoice,
            tables.invoices.values().map(|i| &i.invoice_number),
        )?;

        if let Some(promo) = invoice
            .promo_code_id
            .and_then(|id| tables.promo_codes.get_mut(&id))
        {
            promo.usage_count += 1;
            promo.updated_at = Utc::now();
        }

        let now = Utc::now();
        let totals = invoice.totals;
        let created = Invoice {
            id: Uuid::new_v4(),
            invoice_number: number,
            booking_id: invoice.booking_id,
            customer_id: invoice.customer_id,
            promo_code_id: invoice.promo_code_id,
            subtotal: totals.subtotal,
            promo_discount: totals.promo_discount,
            tax: totals.tax,
            total: totals.total,
            payment_status: invoice.payment_status,
            payment_method: invoice.payment_method,
            due_date: invoice.due_date,
            paid_at: invoice.paid_at,
            notes: invoice.notes,
            created_at: now,
            updated_at: now,
        };
        tables.invoices.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Invoice>> {
        Ok(self.tables.lock().await.invoices.get(&id).cloned())
    }

    async fn list(&self, filters: &InvoiceFilters) -> AppResult<Vec<Invoice>> {
        let tables = self.tables.lock().await;
        let mut invoices: Vec<Invoice> = tables
            .invoices
            .values()
            .filter(|i| filters.payment_status.map_or(true, |s| i.payment_status == s))
            .cloned()
            .collect();
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(invoices, filters.limit, filters.offset))
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Invoice>> {
        let tables = self.tables.lock().await;
        let mut invoices: Vec<Invoice> = tables
            .invoices
            .values()
            .filter(|i| i.customer_id == customer_id)
            .cloned()
            .collect();
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invoices)
    }

    async fn list_by_booking(&self, booking_id: Uuid) -> AppResult<Vec<Invoice>> {
        let tables = self.tables.lock().await;
        let mut invoices: Vec<Invoice> = tables
            .invoices
            .values()
            .filter(|i| i.booking_id == booking_id)
            .cloned()
            .collect();
        invoices.sort_by_key(|i| i.created_at);
        Ok(invoices)
    }

    async fn update(&self, id: Uuid, changes: InvoiceChanges) -> AppResult<Invoice> {
        let mut tables = self.tables.lock().await;
        let invoice = tables
            .invoices
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Invoice", &id.to_string()))?;

        if let Some(status) = changes.payment_status {
            invoice.payment_status = status;
        }
        if let Some(method) = changes.payment_method {
            invoice.payment_method = Some(method);
        }
        if let Some(due_date) = changes.due_date {
            invoice.due_date = Some(due_date);
        }
        if let Some(notes) = changes.notes {
            invoice.notes = Some(notes);
        }
        if let Some(paid_at) = changes.paid_at {
            invoice.paid_at = paid_at;
        }
        invoice.updated_at = Utc::now();
        Ok(invoice.clone())
    }

    async fn count_by_promo_code(&self, promo_code_id: Uuid) -> AppResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .invoices
            .values()
            .filter(|i| i.promo_code_id == Some(promo_code_id))
            .count() as i64)
    }

    async fn outstanding_total(&self) -> AppResult<Decimal> {
        let tables = self.tables.lock().await;
        Ok(tables
            .invoices
            .values()
            .filter(|i| i.payment_status != PaymentStatus::Paid)
            .map(|i| i.total)
            .sum())
    }
}

#[async_trait]
impl PromoCodeRepository for MemoryStore {
    async fn create(&self, promo: NewPromoCode) -> AppResult<PromoCode> {
        let mut tables = self.tables.lock().await;
        if tables.promo_codes.values().any(|p| p.code == promo.code) {
            return Err(AppError::Conflict(format!(
                "Promo code '{}' already exists",
                promo.code
            )));
        }
        let now = Utc::now();
        let created = PromoCode {
            id: Uuid::new_v4(),
            code: promo.code,
            description: promo.description,
            discount_type: promo.discount_type,
            discount_value: promo.discount_value,
            min_booking_amount: promo.min_booking_amount,
            max_discount: promo.max_discount,
            usage_limit: promo.usage_limit,
            usage_count: 0,
            valid_from: Some(promo.valid_from),
            valid_until: Some(promo.valid_until),
            is_active: promo.is_active,
            created_at: now,
            updated_at: now,
        };
        tables.promo_codes.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<PromoCode>> {
        Ok(self.tables.lock().await.promo_codes.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<PromoCode>> {
        let tables = self.tables.lock().await;
        Ok(tables.promo_codes.values().find(|p| p.code == code).cloned())
    }

    async fn list(&self) -> AppResult<Vec<PromoCode>> {
        let tables = self.tables.lock().await;
        let mut promos: Vec<PromoCode> = tables.promo_codes.values().cloned().collect();
        promos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(promos)
    }

    async fn update(&self, id: Uuid, changes: PromoCodeChanges) -> AppResult<PromoCode> {
        let mut tables = self.tables.lock().await;
        let promo = tables
            .promo_codes
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Promo code", &id.to_string()))?;

        let mut updated = promo.clone();
        if let Some(description) = changes.description {
            updated.description = Some(description);
        }
        if let Some(discount_type) = changes.discount_type {
            updated.discount_type = discount_type;
        }
        if let Some(value) = changes.discount_value {
            updated.discount_value = value;
        }
        if let Some(min) = changes.min_booking_amount {
            updated.min_booking_amount = Some(min);
        }
        if let Some(max) = changes.max_discount {
            updated.max_discount = Some(max);
        }
        if let Some(limit) = changes.usage_limit {
            updated.usage_limit = Some(limit);
        }
        if let Some(from) = changes.valid_from {
            updated.valid_from = Some(from);
        }
        if let Some(until) = changes.valid_until {
            updated.valid_until = Some(until);
        }
        if let Some(active) = changes.is_active {
            updated.is_active = active;
        }

        // Mismos CHECK que la tabla
        let window_ok = match (updated.valid_from, updated.valid_until) {
            (Some(from), Some(until)) => until > from,
            _ => true,
        };
        let usage_ok = updated.usage_limit.map_or(true, |limit| updated.usage_count <= limit);
        if !window_ok || !usage_ok {
            return Err(AppError::BadRequest(
                "Promo code update violates its constraints".to_string(),
            ));
        }

        updated.updated_at = Utc::now();
        *promo = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if !tables.promo_codes.contains_key(&id) {
            return Err(not_found_error("Promo code", &id.to_string()));
        }
        if tables.invoices.values().any(|i| i.promo_code_id == Some(id)) {
            return Err(still_referenced());
        }
        tables.promo_codes.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl DriverRepository for MemoryStore {
    async fn create(&self, driver: NewDriver) -> AppResult<Driver> {
        let mut tables = self.tables.lock().await;
        if let Some(email) = &driver.email {
            if tables
                .drivers
                .values()
                .any(|d| d.email.as_deref().map_or(false, |e| e.eq_ignore_ascii_case(email)))
            {
                return Err(AppError::Conflict(
                    "A driver with this email already exists".to_string(),
                ));
            }
        }
        let now = Utc::now();
        let created = Driver {
            id: Uuid::new_v4(),
            first_name: driver.first_name,
            last_name: driver.last_name,
            email: driver.email,
            phone: driver.phone,
            license_number: driver.license_number,
            license_expiry: driver.license_expiry,
            hire_date: driver.hire_date,
            employment_type: driver.employment_type,
            notes: driver.notes,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.drivers.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>> {
        Ok(self.tables.lock().await.drivers.get(&id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Driver>> {
        let tables = self.tables.lock().await;
        let mut drivers: Vec<Driver> = tables.drivers.values().cloned().collect();
        drivers.sort_by(|a, b| {
            b.is_active
                .cmp(&a.is_active)
                .then_with(|| a.last_name.cmp(&b.last_name))
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        Ok(drivers)
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> AppResult<bool> {
        let tables = self.tables.lock().await;
        Ok(tables.drivers.values().any(|d| {
            Some(d.id) != except
                && d.email.as_deref().map_or(false, |e| e.eq_ignore_ascii_case(email))
        }))
    }

    async fn update(&self, id: Uuid, changes: DriverChanges) -> AppResult<Driver> {
        let mut tables = self.tables.lock().await;
        let driver = tables
            .drivers
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Driver", &id.to_string()))?;

        if let Some(first_name) = changes.first_name {
            driver.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            driver.last_name = last_name;
        }
        if let Some(email) = changes.email {
            driver.email = Some(email);
        }
        if let Some(phone) = changes.phone {
            driver.phone = phone;
        }
        if let Some(license_number) = changes.license_number {
            driver.license_number = license_number;
        }
        if let Some(expiry) = changes.license_expiry {
            driver.license_expiry = Some(expiry);
        }
        if let Some(hire_date) = changes.hire_date {
            driver.hire_date = Some(hire_date);
        }
        if let Some(employment_type) = changes.employment_type {
            driver.employment_type = Some(employment_type);
        }
        if let Some(notes) = changes.notes {
            driver.notes = Some(notes);
        }
        if let Some(active) = changes.is_active {
            driver.is_active = active;
        }
        driver.updated_at = Utc::now();
        Ok(driver.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if !tables.drivers.contains_key(&id) {
            return Err(not_found_error("Driver", &id.to_string()));
        }
        if tables.bookings.values().any(|b| b.driver_id == Some(id)) {
            return Err(still_referenced());
        }
        tables.drivers.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn create(&self, vehicle: NewVehicle) -> AppResult<VehicleDetails> {
        let mut tables = self.tables.lock().await;
        if tables.vehicles.values().any(|v| v.slug == vehicle.slug) {
            return Err(AppError::Conflict(
                "A vehicle with this slug already exists".to_string(),
            ));
        }
        let now = Utc::now();
        let created = Vehicle {
            id: Uuid::new_v4(),
            slug: vehicle.slug,
            name: vehicle.name,
            category: vehicle.category,
            description: vehicle.description,
            capacity: vehicle.capacity,
            hourly_rate: vehicle.hourly_rate,
            minimum_hours: vehicle.minimum_hours,
            features: vehicle.features,
            amenities: vehicle.amenities,
            is_active: vehicle.is_active,
            is_featured: vehicle.is_featured,
            created_at: now,
            updated_at: now,
        };
        tables.vehicles.insert(created.id, created.clone());
        replace_images(&mut tables, created.id, &vehicle.images);
        Ok(vehicle_details(&tables, &created))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<VehicleDetails>> {
        let tables = self.tables.lock().await;
        Ok(tables.vehicles.get(&id).map(|v| vehicle_details(&tables, v)))
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<VehicleDetails>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .vehicles
            .values()
            .find(|v| v.slug == slug)
            .map(|v| vehicle_details(&tables, v)))
    }

    async fn list(&self, active_only: bool) -> AppResult<Vec<VehicleDetails>> {
        let tables = self.tables.lock().await;
        let mut vehicles: Vec<&Vehicle> = tables
            .vehicles
            .values()
            .filter(|v| !active_only || v.is_active)
            .collect();
        vehicles.sort_by(|a, b| {
            b.is_featured
                .cmp(&a.is_featured)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(vehicles
            .into_iter()
            .map(|v| vehicle_details(&tables, v))
            .collect())
    }

    async fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> AppResult<bool> {
        let tables = self.tables.lock().await;
        Ok(tables
            .vehicles
            .values()
            .any(|v| v.slug == slug && Some(v.id) != except))
    }

    async fn update(&self, id: Uuid, changes: VehicleChanges) -> AppResult<VehicleDetails> {
        let mut tables = self.tables.lock().await;
        if let Some(slug) = &changes.slug {
            if tables.vehicles.values().any(|v| &v.slug == slug && v.id != id) {
                return Err(AppError::Conflict(
                    "A vehicle with this slug already exists".to_string(),
                ));
            }
        }

        let vehicle = tables
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        if let Some(slug) = changes.slug {
            vehicle.slug = slug;
        }
        if let Some(name) = changes.name {
            vehicle.name = name;
        }
        if let Some(category) = changes.category {
            vehicle.category = category;
        }
        if let Some(description) = changes.description {
            vehicle.description = Some(description);
        }
        if let Some(capacity) = changes.capacity {
            vehicle.capacity = capacity;
        }
        if let Some(rate) = changes.hourly_rate {
            vehicle.hourly_rate = rate;
        }
        if let Some(hours) = changes.minimum_hours {
            vehicle.minimum_hours = hours;
        }
        if let Some(features) = changes.features {
            vehicle.features = features;
        }
        if let Some(amenities) = changes.amenities {
            vehicle.amenities = amenities;
        }
        if let Some(active) = changes.is_active {
            vehicle.is_active = active;
        }
        if let Some(featured) = changes.is_featured {
            vehicle.is_featured = featured;
        }
        vehicle.updated_at = Utc::now();
        let vehicle = vehicle.clone();

        if let Some(images) = changes.images {
            replace_images(&mut tables, id, &images);
        }
        Ok(vehicle_details(&tables, &vehicle))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if !tables.vehicles.contains_key(&id) {
            return Err(not_found_error("Vehicle", &id.to_string()));
        }
        if tables.bookings.values().any(|b| b.vehicle_id == Some(id)) {
            return Err(still_referenced());
        }
        tables.vehicles.remove(&id);
        tables.vehicle_images.retain(|i| i.vehicle_id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_quote(email: &str) -> NewQuote {
        NewQuote {
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
            email: email.to_string(),
            phone: "3125550199".to_string(),
            service_type: "HOURLY".to_string(),
            event_type: "WEDDING".to_string(),
            event_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            pickup_time: None,
            pickup_location: None,
            dropoff_location: None,
            passenger_count: 2,
            vehicle_preference: None,
            special_requests: None,
            customer_id: None,
        }
    }

    #[tokio::test]
    async fn test_claim_reminder_is_exclusive() {
        let store = MemoryStore::new();
        let quote = QuoteRepository::create(&store, new_quote("a@example.com"))
            .await
            .unwrap();
        let now = Utc::now();

        assert!(store.claim_reminder(quote.id, now).await.unwrap());
        assert!(!store.claim_reminder(quote.id, now).await.unwrap());

        store.release_reminder(quote.id).await.unwrap();
        assert!(store.claim_reminder(quote.id, now).await.unwrap());
    }

    #[tokio::test]
    async fn test_link_customer_by_email_ignores_case() {
        let store = MemoryStore::new();
        QuoteRepository::create(&store, new_quote("Ana@Example.com"))
            .await
            .unwrap();
        QuoteRepository::create(&store, new_quote("other@example.com"))
            .await
            .unwrap();

        let linked = store
            .link_customer_by_email("ana@example.com", Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(linked, 1);
    }

    #[test]
    fn test_page_bounds() {
        let rows: Vec<i32> = (0..10).collect();
        assert_eq!(page(rows.clone(), Some(3), Some(2)), vec![2, 3, 4]);
        assert_eq!(page(rows.clone(), None, Some(8)), vec![8, 9]);
        assert!(page(rows, Some(5), Some(20)).is_empty());
    }
}
