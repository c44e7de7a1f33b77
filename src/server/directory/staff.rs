use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{RequireAuth, hash_password};
use crate::server::AppState;
use crate::server::access::require_permission;
use crate::server::dto::{CreateStaffRequest, StaffListParams, UpdateStaffRequest};
use crate::server::response::{
    ApiError, ApiJson, ApiQuery, ApiResponse, StoreOptionExt, StoreResultExt,
};
use crate::server::validation::{validate_email, validate_password, validate_required};
use crate::types::permission::{STAFF_READ, STAFF_WRITE};
use crate::types::{Staff, StaffPosition, User};

fn parse_position(value: &str) -> Result<StaffPosition, ApiError> {
    StaffPosition::parse(value.trim()).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Invalid position '{value}', expected director, coordinator, secretary or teacher"
        ))
    })
}

pub async fn list_staff(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<StaffListParams>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, STAFF_READ)?;

    let staff = state
        .store
        .list_staff(params.unit_id.as_deref())
        .api_err("Failed to list staff")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(staff)))
}

pub async fn get_staff(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, STAFF_READ)?;

    let staff = state
        .store
        .get_staff(&id)
        .api_err("Failed to get staff member")?
        .or_not_found("Staff member not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(staff)))
}

/// Creates a staff member and its login account. The account role follows
/// the position.
pub async fn create_staff(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateStaffRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, STAFF_WRITE)?;

    let name = validate_required(&req.name, "Name")?;
    let email = validate_email(&req.email)?;
    validate_password(&req.password)?;
    let position = parse_position(&req.position)?;

    let password_hash = hash_password(&req.password).api_err("Failed to hash password")?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        name: name.clone(),
        role: position.role(),
        password_hash,
        created_at: now,
        updated_at: now,
    };
    let staff = Staff {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        unit_id: req.unit_id,
        name,
        position,
        phone: req.phone,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .create_staff_with_user(&staff, &user)
        .api_err("Failed to create staff member")?;

    tracing::info!(staff = %staff.id, position = position.as_str(), "staff member created");

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(staff))))
}

pub async fn update_staff(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateStaffRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, STAFF_WRITE)?;

    let mut staff = state
        .store
        .get_staff(&id)
        .api_err("Failed to get staff member")?
        .or_not_found("Staff member not found")?;

    if let Some(unit_id) = req.unit_id {
        staff.unit_id = unit_id;
    }
    if let Some(name) = req.name {
        staff.name = validate_required(&name, "Name")?;
    }
    if req.phone.is_some() {
        staff.phone = req.phone;
    }
    if let Some(position) = req.position.as_deref() {
        staff.position = parse_position(position)?;
    }
    staff.updated_at = Utc::now();

    state
        .store
        .update_staff(&staff)
        .api_err("Failed to update staff member")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(staff)))
}

pub async fn delete_staff(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, STAFF_WRITE)?;

    let deleted = state
        .store
        .delete_staff(&id)
        .api_err("Failed to delete staff member")?;

    if !deleted {
        return Err(ApiError::not_found("Staff member not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
