use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::Admin;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAuthResponse {
    pub success: bool,
    pub token: String,
    pub admin: Admin,
}

// Resumen del panel
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub quotes_by_status: BTreeMap<&'static str, i64>,
    pub bookings_by_status: BTreeMap<&'static str, i64>,
    pub outstanding_invoice_total: Decimal,
}
