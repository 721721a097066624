use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::check_auth;
use crate::errors::AppError;
use crate::models::{BookingStatus, StatusCommand};
use crate::services::checkout::{self, BalanceSummary};
use crate::services::status_machine::StatusMachine;
use crate::state::AppState;

#[derive(Serialize)]
pub struct BalanceResponse {
    booking_id: i64,
    status: Option<BookingStatus>,
    #[serde(flatten)]
    balance: BalanceSummary,
    settable_statuses: Vec<BookingStatus>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: BookingStatus,
    pub employee_id: i64,
}

#[derive(Deserialize)]
pub struct EmployeeRequest {
    pub employee_id: i64,
}

#[derive(Serialize)]
pub struct StatusChangeResponse {
    booking_id: i64,
    from: Option<BookingStatus>,
    to: Option<BookingStatus>,
}

fn status_change(state: &AppState, command: StatusCommand) -> Json<StatusChangeResponse> {
    let catalog = state.desk.catalog();
    Json(StatusChangeResponse {
        booking_id: command.booking_id,
        from: catalog.booking_status(command.from_status_id),
        to: catalog.booking_status(command.to_status_id),
    })
}

// GET /api/bookings/:id/balance
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<BalanceResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let catalog = state.desk.catalog();
    let booking = state.desk.booking(id).await?;

    Ok(Json(BalanceResponse {
        booking_id: id,
        status: booking.status(catalog),
        balance: checkout::summarize(&booking),
        settable_statuses: StatusMachine::new(catalog).settable_statuses(&booking),
    }))
}

// POST /api/bookings/:id/status
pub async fn change_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<StatusChangeResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let command = state.desk.change_status(id, req.status, req.employee_id).await?;
    Ok(status_change(&state, command))
}

// POST /api/bookings/:id/approve
pub async fn approve(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<EmployeeRequest>,
) -> Result<Json<StatusChangeResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let command = state.desk.approve(id, req.employee_id).await?;
    Ok(status_change(&state, command))
}

// POST /api/bookings/:id/cancel
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<EmployeeRequest>,
) -> Result<Json<StatusChangeResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let command = state.desk.cancel(id, req.employee_id).await?;
    Ok(status_change(&state, command))
}

// POST /api/bookings/:id/checkout
pub async fn check_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<EmployeeRequest>,
) -> Result<Json<StatusChangeResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let command = state.desk.check_out(id, req.employee_id).await?;
    Ok(status_change(&state, command))
}
