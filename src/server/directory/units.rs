use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::access::require_permission;
use crate::server::dto::{CreateUnitRequest, UpdateUnitRequest};
use crate::server::response::{ApiError, ApiJson, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_required;
use crate::types::Unit;
use crate::types::permission::{UNITS_READ, UNITS_WRITE};

pub async fn list_units(auth: RequireAuth, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, UNITS_READ)?;

    let units = state.store.list_units().api_err("Failed to list units")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(units)))
}

pub async fn get_unit(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, UNITS_READ)?;

    let unit = state
        .store
        .get_unit(&id)
        .api_err("Failed to get unit")?
        .or_not_found("Unit not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(unit)))
}

pub async fn create_unit(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateUnitRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, UNITS_WRITE)?;

    let now = Utc::now();
    let unit = Unit {
        id: Uuid::new_v4().to_string(),
        name: validate_required(&req.name, "Unit name")?,
        address: req.address,
        phone: req.phone,
        active: req.active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .create_unit(&unit)
        .api_err("Failed to create unit")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(unit))))
}

pub async fn update_unit(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateUnitRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, UNITS_WRITE)?;

    let mut unit = state
        .store
        .get_unit(&id)
        .api_err("Failed to get unit")?
        .or_not_found("Unit not found")?;

    if let Some(name) = req.name {
        unit.name = validate_required(&name, "Unit name")?;
    }
    if req.address.is_some() {
        unit.address = req.address;
    }
    if req.phone.is_some() {
        unit.phone = req.phone;
    }
    if let Some(active) = req.active {
        unit.active = active;
    }
    unit.updated_at = Utc::now();

    state
        .store
        .update_unit(&unit)
        .api_err("Failed to update unit")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(unit)))
}

pub async fn delete_unit(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, UNITS_WRITE)?;

    let deleted = state
        .store
        .delete_unit(&id)
        .api_err("Failed to delete unit")?;

    if !deleted {
        return Err(ApiError::not_found("Unit not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
