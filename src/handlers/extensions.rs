use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use super::check_auth;
use crate::errors::AppError;
use crate::models::{Money, PaymentMethod};
use crate::services::extension::ExtensionQuote;
use crate::services::front_desk::{ExtensionReceipt, ExtensionRequest};
use crate::services::ledger::RoomEligibility;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct QuoteRequest {
    #[serde(default)]
    pub rooms: Vec<String>,
    pub new_checkout: NaiveDate,
}

#[derive(Deserialize)]
pub struct ExtendRequest {
    #[serde(default)]
    pub rooms: Vec<String>,
    pub new_checkout: NaiveDate,
    pub payment_amount: Money,
    pub payment_method: PaymentMethod,
    pub employee_id: i64,
}

// GET /api/bookings/:id/extension/rooms
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Vec<RoomEligibility>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.desk.extension_rooms(id).await?))
}

// POST /api/bookings/:id/extension/quote
pub async fn quote(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<ExtensionQuote>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let quote = state.desk.quote_extension(id, &req.rooms, req.new_checkout).await?;
    Ok(Json(quote))
}

// POST /api/bookings/:id/extension
pub async fn extend(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<ExtendRequest>,
) -> Result<Json<ExtensionReceipt>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let request = ExtensionRequest {
        rooms: req.rooms,
        new_checkout: req.new_checkout,
        payment_amount: req.payment_amount,
        payment_method: req.payment_method,
        employee_id: req.employee_id,
    };
    Ok(Json(state.desk.extend(id, request).await?))
}
