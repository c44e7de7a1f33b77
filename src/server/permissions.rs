use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::access::{permission_breakdown, require_permission};
use crate::server::dto::{
    CreatePermissionRequest, OverrideRequest, RoleResponse, SetRolePermissionsRequest,
    UserPermissionsResponse,
};
use crate::server::response::{ApiError, ApiJson, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_permission_name, validate_required};
use crate::types::permission::{PERMISSIONS_MANAGE, PERMISSIONS_READ};
use crate::types::{Permission, Role, User, UserPermissionOverride};

pub fn permissions_router() -> Router<Arc<AppState>> {
    Router::new()
        // Catalog
        .route("/permissions", get(list_permissions))
        .route("/permissions", post(create_permission))
        // Role baselines
        .route("/roles", get(list_roles))
        .route("/roles/{role}/permissions", put(set_role_permissions))
        // Per-user overrides
        .route("/users/{id}/permissions", get(get_user_permissions))
        .route("/users/{id}/overrides", get(list_overrides))
        .route("/users/{id}/overrides", post(upsert_override))
        .route(
            "/users/{id}/overrides/{permission}",
            delete(delete_override),
        )
}

fn load_user(state: &AppState, id: &str) -> Result<User, ApiError> {
    state
        .store
        .get_user(id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")
}

pub async fn list_permissions(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, PERMISSIONS_READ)?;

    let permissions = state
        .store
        .list_permissions()
        .api_err("Failed to list permissions")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(permissions)))
}

pub async fn create_permission(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreatePermissionRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, PERMISSIONS_MANAGE)?;

    let name = req.name.trim().to_string();
    validate_permission_name(&name)?;
    let display_name = validate_required(&req.display_name, "Display name")?;

    let permission = Permission {
        id: Uuid::new_v4().to_string(),
        name,
        display_name,
        description: req.description,
    };

    state
        .store
        .create_permission(&permission)
        .api_err("Failed to create permission")?;

    tracing::info!(permission = %permission.name, "permission created");

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(permission))))
}

pub async fn list_roles(auth: RequireAuth, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, PERMISSIONS_READ)?;

    let roles = Role::ALL
        .iter()
        .map(|role| -> crate::error::Result<RoleResponse> {
            let permissions = state.store.list_role_permissions(role.as_str())?;
            Ok(RoleResponse {
                name: role.as_str().to_string(),
                permissions,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .api_err("Failed to list roles")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(roles)))
}

pub async fn set_role_permissions(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(role): Path<String>,
    ApiJson(req): ApiJson<SetRolePermissionsRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, PERMISSIONS_MANAGE)?;

    let role = Role::parse(&role).or_not_found("Role not found")?;

    let mut names = req.permissions;
    names.sort();
    names.dedup();

    state
        .store
        .set_role_permissions(role.as_str(), &names)
        .api_err("Failed to update role permissions")?;

    let permissions = state
        .store
        .list_role_permissions(role.as_str())
        .api_err("Failed to list role permissions")?;

    tracing::info!(role = %role, count = permissions.len(), "role baseline replaced");

    Ok::<_, ApiError>(Json(ApiResponse::success(RoleResponse {
        name: role.as_str().to_string(),
        permissions,
    })))
}

pub async fn get_user_permissions(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, PERMISSIONS_READ)?;

    let user = load_user(&state, &id)?;
    let breakdown = permission_breakdown(state.store.as_ref(), &user)
        .api_err("Failed to resolve permissions")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(UserPermissionsResponse {
        user_id: user.id,
        role: user.role.as_str().to_string(),
        baseline: breakdown.baseline.to_strings(),
        overrides: breakdown.overrides,
        effective: breakdown.effective.to_strings(),
    })))
}

pub async fn list_overrides(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, PERMISSIONS_READ)?;

    let user = load_user(&state, &id)?;
    let overrides = state
        .store
        .list_user_overrides(&user.id)
        .api_err("Failed to list overrides")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(overrides)))
}

/// Grants or denies one permission for a user, replacing any previous
/// override for the same permission.
pub async fn upsert_override(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<OverrideRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, PERMISSIONS_MANAGE)?;

    let user = load_user(&state, &id)?;
    let permission = state
        .store
        .get_permission_by_name(req.permission.trim())
        .api_err("Failed to get permission")?
        .or_not_found("Permission not found")?;

    let now = Utc::now();
    let record = UserPermissionOverride {
        user_id: user.id.clone(),
        permission_id: permission.id.clone(),
        permission: permission.name.clone(),
        is_granted: req.is_granted,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .upsert_override(&record)
        .api_err("Failed to save override")?;

    tracing::info!(
        user = %user.id,
        permission = %permission.name,
        granted = req.is_granted,
        "permission override saved"
    );

    let overrides = state
        .store
        .list_user_overrides(&user.id)
        .api_err("Failed to list overrides")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(overrides)))
}

pub async fn delete_override(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path((id, permission)): Path<(String, String)>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, PERMISSIONS_MANAGE)?;

    let user = load_user(&state, &id)?;
    let permission = state
        .store
        .get_permission_by_name(&permission)
        .api_err("Failed to get permission")?
        .or_not_found("Permission not found")?;

    let deleted = state
        .store
        .delete_override(&user.id, &permission.id)
        .api_err("Failed to delete override")?;

    if !deleted {
        return Err(ApiError::not_found("Override not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
