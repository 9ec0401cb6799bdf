use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dto::promo_code_dto::{
    CreatePromoCodeRequest, UpdatePromoCodeRequest, ValidatePromoCodeRequest,
    ValidatePromoCodeResponse,
};
use crate::models::{DiscountType, NewPromoCode, PromoCode, PromoCodeChanges};
use crate::repositories::Repositories;
use crate::state::AppState;
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};
use crate::utils::validation::{
    field_error, optional_text, require, require_text, validate_instant, validate_money,
    validate_promo_code,
};

pub struct PromoCodeController {
    repos: Repositories,
}

impl PromoCodeController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repos: state.repos.clone(),
        }
    }

    pub async fn create(&self, request: CreatePromoCodeRequest) -> AppResult<PromoCode> {
        let code = validate_promo_code(&require_text("code", request.code.as_deref())?)?;
        let discount_type = require("discountType", &request.discount_type)?;
        let discount_value = require("discountValue", &request.discount_value)?;
        let valid_from = parse_instant("validFrom", require_text("validFrom", request.valid_from.as_deref())?)?;
        let valid_until = parse_instant("validUntil", require_text("validUntil", request.valid_until.as_deref())?)?;

        let discount_value = validate_discount(discount_type, discount_value)?;
        check_window(valid_from, valid_until)?;
        let usage_limit = request.usage_limit.map(validate_usage_limit).transpose()?;

        if self.repos.promo_codes.find_by_code(&code).await?.is_some() {
            return Err(conflict_error("Promo code", "code", &code));
        }

        let promo = self
            .repos
            .promo_codes
            .create(NewPromoCode {
                code,
                description: optional_text(request.description),
                discount_type,
                discount_value,
                min_booking_amount: optional_money("minBookingAmount", request.min_booking_amount)?,
                max_discount: optional_money("maxDiscount", request.max_discount)?,
                usage_limit,
                valid_from,
                valid_until,
                is_active: request.is_active.unwrap_or(true),
            })
            .await?;

        tracing::info!("🎟️ Código promocional {} creado", promo.code);
        Ok(promo)
    }

    pub async fn list(&self) -> AppResult<Vec<PromoCode>> {
        self.repos.promo_codes.list().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<PromoCode> {
        self.find(id).await
    }

    pub async fn update(&self, id: Uuid, request: UpdatePromoCodeRequest) -> AppResult<PromoCode> {
        let promo = self.find(id).await?;

        if let Some(code) = request.code.as_deref() {
            if code.trim() != promo.code {
                return Err(AppError::BadRequest("Promo code cannot be changed".to_string()));
            }
        }

        let valid_from = request
            .valid_from
            .map(|v| parse_instant("validFrom", v))
            .transpose()?;
        let valid_until = request
            .valid_until
            .map(|v| parse_instant("validUntil", v))
            .transpose()?;

        // Ventana revalidada con los valores combinados
        if valid_from.is_some() || valid_until.is_some() {
            if let (Some(from), Some(until)) =
                (valid_from.or(promo.valid_from), valid_until.or(promo.valid_until))
            {
                check_window(from, until)?;
            }
        }

        let discount_type = request.discount_type.unwrap_or(promo.discount_type);
        let discount_value = match (request.discount_type, request.discount_value) {
            (_, Some(value)) => Some(validate_discount(discount_type, value)?),
            (Some(_), None) => {
                validate_discount(discount_type, promo.discount_value)?;
                None
            }
            (None, None) => None,
        };

        if let Some(limit) = request.usage_limit {
            let limit = validate_usage_limit(limit)?;
            if limit < promo.usage_count {
                return Err(AppError::BadRequest(format!(
                    "usageLimit cannot be lower than the current usage count ({})",
                    promo.usage_count
                )));
            }
        }

        let updated = self
            .repos
            .promo_codes
            .update(
                id,
                PromoCodeChanges {
                    description: request.description,
                    discount_type: request.discount_type,
                    discount_value,
                    min_booking_amount: optional_money("minBookingAmount", request.min_booking_amount)?,
                    max_discount: optional_money("maxDiscount", request.max_discount)?,
                    usage_limit: request.usage_limit,
                    valid_from,
                    valid_until,
                    is_active: request.is_active,
                },
            )
            .await?;

        tracing::info!("✏️ Código promocional {} actualizado", updated.code);
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let promo = self.find(id).await?;
        if self.repos.invoices.count_by_promo_code(id).await? > 0 {
            return Err(AppError::Conflict(
                "Promo code is used by invoices; deactivate it instead".to_string(),
            ));
        }

        self.repos.promo_codes.delete(id).await?;
        tracing::info!("🗑️ Código promocional {} eliminado", promo.code);
        Ok(())
    }

    /// Consulta pública: descuento que se aplicaría a `amount`
    pub async fn validate(&self, request: ValidatePromoCodeRequest) -> AppResult<ValidatePromoCodeResponse> {
        let code = require_text("code", request.code.as_deref())?.to_uppercase();
        let amount = validate_money("amount", require("amount", &request.amount)?)?;

        let rejected = |code: String, reason: String| ValidatePromoCodeResponse {
            success: true,
            valid: false,
            code,
            discount: None,
            discount_type: None,
            reason: Some(reason),
        };

        let Some(promo) = self.repos.promo_codes.find_by_code(&code).await? else {
            return Ok(rejected(code, "Promo code not found".to_string()));
        };

        if let Err(reason) = promo.check_redeemable(Utc::now(), amount) {
            return Ok(rejected(promo.code, reason.to_string()));
        }

        let discount = promo.discount_for(amount)?;
        Ok(ValidatePromoCodeResponse {
            success: true,
            valid: true,
            discount: Some(discount),
            discount_type: Some(promo.discount_type),
            code: promo.code,
            reason: None,
        })
    }

    async fn find(&self, id: Uuid) -> AppResult<PromoCode> {
        self.repos
            .promo_codes
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Promo code", &id.to_string()))
    }
}

fn parse_instant(field: &'static str, value: String) -> AppResult<DateTime<Utc>> {
    validate_instant(value.trim()).map_err(|e| field_error(field, e))
}

fn check_window(from: DateTime<Utc>, until: DateTime<Utc>) -> AppResult<()> {
    if until <= from {
        return Err(AppError::BadRequest(
            "validUntil must be after validFrom".to_string(),
        ));
    }
    Ok(())
}

fn validate_discount(discount_type: DiscountType, value: Decimal) -> AppResult<Decimal> {
    let value = validate_money("discountValue", value)?;
    if value.is_zero() {
        return Err(AppError::BadRequest("discountValue must be positive".to_string()));
    }
    if discount_type == DiscountType::Percentage && value > Decimal::ONE_HUNDRED {
        return Err(AppError::BadRequest(
            "Percentage discounts cannot exceed 100".to_string(),
        ));
    }
    Ok(value)
}

fn validate_usage_limit(limit: i32) -> AppResult<i32> {
    if limit < 1 {
        return Err(AppError::BadRequest("usageLimit must be at least 1".to_string()));
    }
    Ok(limit)
}

fn optional_money(field: &str, value: Option<Decimal>) -> AppResult<Option<Decimal>> {
    value.map(|v| validate_money(field, v)).transpose()
}
