use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use super::check_auth;
use crate::errors::AppError;
use crate::models::{VisitorLog, VisitorStatus};
use crate::services::front_desk::RoomOccupancy;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NewVisitorRequest {
    pub visitor_name: String,
    #[serde(default)]
    pub purpose: String,
}

#[derive(Deserialize)]
pub struct VisitorStatusRequest {
    pub status: VisitorStatus,
}

// GET /api/rooms/:id/occupancy
pub async fn get_occupancy(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<RoomOccupancy>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.desk.room_occupancy(id).await?))
}

// POST /api/rooms/:id/visitors
pub async fn add_visitor(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<NewVisitorRequest>,
) -> Result<(StatusCode, Json<VisitorLog>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let log = state.desk.add_visitor(id, &req.visitor_name, &req.purpose).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

// POST /api/visitors/:id/status
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<VisitorStatusRequest>,
) -> Result<Json<VisitorLog>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.desk.set_visitor_status(id, req.status).await?))
}

// POST /api/visitors/:id/checkout
pub async fn check_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<VisitorLog>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.desk.check_out_visitor(id).await?))
}
