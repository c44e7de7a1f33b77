use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::access::require_permission;
use crate::server::dto::{DateParams, EnrollRequest};
use crate::server::response::{
    ApiError, ApiJson, ApiQuery, ApiResponse, StoreOptionExt, StoreResultExt,
};
use crate::types::permission::{CLASSES_READ, CLASSES_WRITE};
use crate::types::{Enrollment, parse_date};

/// Parses an optional `YYYY-MM-DD`, defaulting to today (UTC).
pub(super) fn date_or_today(value: Option<&str>) -> Result<NaiveDate, ApiError> {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => Ok(parse_date(v)?),
        None => Ok(Utc::now().date_naive()),
    }
}

pub async fn list_enrollments(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, CLASSES_READ)?;

    state
        .store
        .get_class_slot(&class_id)
        .api_err("Failed to get class")?
        .or_not_found("Class not found")?;

    let enrollments = state
        .store
        .list_enrollments(&class_id)
        .api_err("Failed to list enrollments")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(enrollments)))
}

pub async fn enroll_student(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
    ApiJson(req): ApiJson<EnrollRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, CLASSES_WRITE)?;

    let enrollment = Enrollment {
        class_id,
        student_id: req.student_id,
        enrolled_on: date_or_today(req.enrolled_on.as_deref())?,
        ended_on: None,
    };

    let stored = state
        .store
        .enroll_student(&enrollment)
        .api_err("Failed to enroll student")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(stored))))
}

/// Ends an active enrollment on `?date=` (default today). Attendance history
/// is kept.
pub async fn end_enrollment(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path((class_id, student_id)): Path<(String, String)>,
    ApiQuery(params): ApiQuery<DateParams>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, CLASSES_WRITE)?;

    let ended_on = date_or_today(params.date.as_deref())?;
    let ended = state
        .store
        .end_enrollment(&class_id, &student_id, ended_on)
        .api_err("Failed to end enrollment")?;

    if !ended {
        return Err(ApiError::not_found("Active enrollment not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
