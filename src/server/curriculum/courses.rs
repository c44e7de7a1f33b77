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
use crate::server::dto::{CreateCourseRequest, UpdateCourseRequest};
use crate::server::response::{ApiError, ApiJson, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_required;
use crate::types::Course;
use crate::types::permission::{COURSES_READ, COURSES_WRITE};

pub async fn list_courses(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_READ)?;

    let courses = state.store.list_courses().api_err("Failed to list courses")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(courses)))
}

/// Returns the course with its ordered books, units, videos and activities.
pub async fn get_course(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_READ)?;

    let tree = state
        .store
        .get_course_tree(&id)
        .api_err("Failed to load course")?
        .or_not_found("Course not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(tree)))
}

pub async fn create_course(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateCourseRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_WRITE)?;

    let course = Course {
        id: Uuid::new_v4().to_string(),
        name: validate_required(&req.name, "Course name")?,
        level: validate_required(&req.level, "Level")?,
        language: validate_required(&req.language, "Language")?,
        description: req.description,
        created_at: Utc::now(),
    };

    state
        .store
        .create_course(&course)
        .api_err("Failed to create course")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(course))))
}

pub async fn update_course(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateCourseRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_WRITE)?;

    let mut course = state
        .store
        .get_course(&id)
        .api_err("Failed to get course")?
        .or_not_found("Course not found")?;

    if let Some(name) = req.name {
        course.name = validate_required(&name, "Course name")?;
    }
    if let Some(level) = req.level {
        course.level = validate_required(&level, "Level")?;
    }
    if let Some(language) = req.language {
        course.language = validate_required(&language, "Language")?;
    }
    if req.description.is_some() {
        course.description = req.description;
    }

    state
        .store
        .update_course(&course)
        .api_err("Failed to update course")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(course)))
}

pub async fn delete_course(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_WRITE)?;

    let deleted = state
        .store
        .delete_course(&id)
        .api_err("Failed to delete course")?;

    if !deleted {
        return Err(ApiError::not_found("Course not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
