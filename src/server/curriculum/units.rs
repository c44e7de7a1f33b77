use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::access::require_permission;
use crate::server::dto::{CreateCourseUnitRequest, UpdateCourseUnitRequest};
use crate::server::response::{ApiError, ApiJson, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_required;
use crate::types::permission::{COURSES_READ, COURSES_WRITE};
use crate::types::{CourseUnit, UnitType};

fn parse_unit_type(value: &str) -> Result<UnitType, ApiError> {
    UnitType::parse(value.trim()).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Invalid unit_type '{value}', expected lesson, checkpoint or review"
        ))
    })
}

pub async fn list_units(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_READ)?;

    state
        .store
        .get_book(&book_id)
        .api_err("Failed to get book")?
        .or_not_found("Book not found")?;

    let units = state
        .store
        .list_course_units(&book_id)
        .api_err("Failed to list course units")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(units)))
}

pub async fn get_unit(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_READ)?;

    let unit = state
        .store
        .get_course_unit(&id)
        .api_err("Failed to get course unit")?
        .or_not_found("Course unit not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(unit)))
}

pub async fn create_unit(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
    ApiJson(req): ApiJson<CreateCourseUnitRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_WRITE)?;

    let unit = CourseUnit {
        id: Uuid::new_v4().to_string(),
        book_id,
        title: validate_required(&req.title, "Title")?,
        display_order: req.display_order,
        unit_type: parse_unit_type(&req.unit_type)?,
    };

    state
        .store
        .create_course_unit(&unit)
        .api_err("Failed to create course unit")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(unit))))
}

pub async fn update_unit(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateCourseUnitRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_WRITE)?;

    let mut unit = state
        .store
        .get_course_unit(&id)
        .api_err("Failed to get course unit")?
        .or_not_found("Course unit not found")?;

    if let Some(title) = req.title {
        unit.title = validate_required(&title, "Title")?;
    }
    if let Some(order) = req.display_order {
        unit.display_order = order;
    }
    if let Some(unit_type) = req.unit_type {
        unit.unit_type = parse_unit_type(&unit_type)?;
    }

    state
        .store
        .update_course_unit(&unit)
        .api_err("Failed to update course unit")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(unit)))
}

pub async fn delete_unit(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_WRITE)?;

    let deleted = state
        .store
        .delete_course_unit(&id)
        .api_err("Failed to delete course unit")?;

    if !deleted {
        return Err(ApiError::not_found("Course unit not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
