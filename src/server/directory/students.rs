use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::access::require_permission;
use crate::server::dto::{CreateStudentRequest, UpdateStudentRequest};
use crate::server::response::{
    ApiError, ApiJson, ApiQuery, ApiResponse, StoreOptionExt, StoreResultExt,
};
use crate::server::validation::{validate_email, validate_required};
use crate::types::permission::{STUDENTS_READ, STUDENTS_WRITE};
use crate::types::{Student, StudentFilter, parse_date};

fn parse_birth_date(value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(parse_date)
        .transpose()
        .map_err(ApiError::from)
}

fn normalize_email(value: Option<&str>) -> Result<Option<String>, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(validate_email)
        .transpose()
}

pub async fn list_students(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<StudentFilter>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, STUDENTS_READ)?;

    let students = state
        .store
        .list_students(&filter)
        .api_err("Failed to list students")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(students)))
}

pub async fn get_student(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, STUDENTS_READ)?;

    let student = state
        .store
        .get_student(&id)
        .api_err("Failed to get student")?
        .or_not_found("Student not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(student)))
}

pub async fn create_student(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateStudentRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, STUDENTS_WRITE)?;

    let now = Utc::now();
    let student = Student {
        id: Uuid::new_v4().to_string(),
        user_id: req.user_id,
        unit_id: req.unit_id,
        name: validate_required(&req.name, "Name")?,
        email: normalize_email(req.email.as_deref())?,
        phone: req.phone,
        birth_date: parse_birth_date(req.birth_date.as_deref())?,
        active: true,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .create_student(&student)
        .api_err("Failed to create student")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(student))))
}

pub async fn update_student(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateStudentRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, STUDENTS_WRITE)?;

    let mut student = state
        .store
        .get_student(&id)
        .api_err("Failed to get student")?
        .or_not_found("Student not found")?;

    if let Some(unit_id) = req.unit_id {
        student.unit_id = unit_id;
    }
    if let Some(name) = req.name {
        student.name = validate_required(&name, "Name")?;
    }
    if let Some(email) = req.email {
        student.email = normalize_email(Some(email.as_str()))?;
    }
    if req.phone.is_some() {
        student.phone = req.phone;
    }
    if let Some(birth_date) = req.birth_date {
        student.birth_date = parse_birth_date(Some(birth_date.as_str()))?;
    }
    if let Some(active) = req.active {
        student.active = active;
    }
    student.updated_at = Utc::now();

    state
        .store
        .update_student(&student)
        .api_err("Failed to update student")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(student)))
}

pub async fn delete_student(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, STUDENTS_WRITE)?;

    let deleted = state
        .store
        .delete_student(&id)
        .api_err("Failed to delete student")?;

    if !deleted {
        return Err(ApiError::not_found("Student not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
