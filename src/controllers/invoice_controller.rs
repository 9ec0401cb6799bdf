use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dto::invoice_dto::{CreateInvoiceRequest, UpdateInvoiceRequest};
use crate::models::{
    Invoice, InvoiceChanges, InvoiceFilters, InvoiceTotals, NewInvoice, PaymentStatus,
};
use crate::repositories::Repositories;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::{field_error, optional_text, require, validate_date, validate_money};

pub struct InvoiceController {
    repos: Repositories,
}

impl InvoiceController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repos: state.repos.clone(),
        }
    }

    /// Facturar una reserva, aplicando un código promocional opcional
    pub async fn create(&self, booking_id: Uuid, request: CreateInvoiceRequest) -> AppResult<Invoice> {
        let booking = self
            .repos
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))?;

        let customer_id = booking.customer_id.ok_or_else(|| {
            AppError::BadRequest("Booking has no customer account".to_string())
        })?;

        let subtotal = validate_money("subtotal", require("subtotal", &request.subtotal)?)?;
        let tax = validate_money("tax", require("tax", &request.tax)?)?;
        let now = Utc::now();

        let mut promo_code_id = None;
        let mut discount = Decimal::ZERO;
        if let Some(code) = optional_text(request.promo_code) {
            let code = code.to_uppercase();
            let promo = self
                .repos
                .promo_codes
                .find_by_code(&code)
                .await?
                .ok_or_else(|| AppError::BadRequest(format!("Promo code '{}' not found", code)))?;

            promo
                .check_redeemable(now, subtotal)
                .map_err(|reason| AppError::BadRequest(reason.to_string()))?;

            discount = promo.discount_for(subtotal)?;
            promo_code_id = Some(promo.id);
        }

        let totals = InvoiceTotals::compute(subtotal, discount, tax)?;

        let due_date = request
            .due_date
            .as_deref()
            .map(|d| validate_date(d).map_err(|e| field_error("dueDate", e)))
            .transpose()?;

        let payment_status = request.payment_status.unwrap_or(PaymentStatus::Pending);
        let paid_at = (payment_status == PaymentStatus::Paid).then_some(now);

        let invoice = self
            .repos
            .invoices
            .create(NewInvoice {
                booking_id,
                customer_id,
                promo_code_id,
                totals,
                payment_status,
                payment_method: optional_text(request.payment_method),
                due_date,
                paid_at,
                notes: optional_text(request.notes),
            })
            .await?;

        tracing::info!(
            "🧾 Factura {} emitida para la reserva {} (total {})",
            invoice.invoice_number,
            booking.booking_number,
            invoice.total
        );
        Ok(invoice)
    }

    pub async fn list(&self, filters: InvoiceFilters) -> AppResult<Vec<Invoice>> {
        self.repos.invoices.list(&filters).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Invoice> {
        self.find(id).await
    }

    pub async fn update(&self, id: Uuid, request: UpdateInvoiceRequest) -> AppResult<Invoice> {
        let invoice = self.find(id).await?;

        // Pasar a PAID marca paidAt; salir de PAID la limpia
        let paid_at = match request.payment_status {
            Some(PaymentStatus::Paid) if invoice.payment_status != PaymentStatus::Paid => {
                Some(Some(Utc::now()))
            }
            Some(status) if status != PaymentStatus::Paid && invoice.payment_status == PaymentStatus::Paid => {
                Some(None)
            }
            _ => None,
        };

        let due_date = request
            .due_date
            .as_deref()
            .map(|d| validate_date(d).map_err(|e| field_error("dueDate", e)))
            .transpose()?;

        let updated = self
            .repos
            .invoices
            .update(
                id,
                InvoiceChanges {
                    payment_status: request.payment_status,
                    payment_method: request.payment_method,
                    due_date,
                    notes: request.notes,
                    paid_at,
                },
            )
            .await?;

        tracing::info!("✏️ Factura {} actualizada", updated.invoice_number);
        Ok(updated)
    }

    async fn find(&self, id: Uuid) -> AppResult<Invoice> {
        self.repos
            .invoices
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Invoice", &id.to_string()))
    }
}
