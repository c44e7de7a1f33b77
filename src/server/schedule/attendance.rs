use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;

use super::enrollments::date_or_today;
use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::access::require_permission;
use crate::server::dto::{
    BulkAttendanceRequest, BulkAttendanceResponse, DateParams, DateRangeParams,
    MarkAttendanceRequest, RosterResponse,
};
use crate::server::response::{ApiError, ApiJson, ApiQuery, ApiResponse, StoreResultExt};
use crate::types::permission::{ATTENDANCE_READ, ATTENDANCE_WRITE};
use crate::types::{AttendanceRecord, AttendanceStatus, parse_date};

fn parse_status(value: &str) -> Result<AttendanceStatus, ApiError> {
    AttendanceStatus::parse(value.trim()).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Invalid status '{value}', expected present, absent or justified"
        ))
    })
}

/// Actively enrolled students with their status on `?date=`.
pub async fn get_roster(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
    ApiQuery(params): ApiQuery<DateParams>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, ATTENDANCE_READ)?;

    let date = date_or_today(params.date.as_deref())?;
    let students = state
        .store
        .get_roster(&class_id, date)
        .api_err("Failed to load roster")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(RosterResponse {
        class_id,
        date,
        students,
    })))
}

pub async fn mark_attendance(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
    ApiQuery(params): ApiQuery<DateParams>,
    ApiJson(req): ApiJson<MarkAttendanceRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, ATTENDANCE_WRITE)?;

    let record = AttendanceRecord {
        class_id,
        student_id: req.student_id,
        date: date_or_today(params.date.as_deref())?,
        status: parse_status(&req.status)?,
        updated_at: Utc::now(),
    };

    state
        .store
        .upsert_attendance(&record)
        .api_err("Failed to save attendance")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(record)))
}

pub async fn mark_all(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
    ApiQuery(params): ApiQuery<DateParams>,
    ApiJson(req): ApiJson<BulkAttendanceRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, ATTENDANCE_WRITE)?;

    let date = date_or_today(params.date.as_deref())?;
    let status = parse_status(&req.status)?;

    let marked = state
        .store
        .mark_all_attendance(&class_id, date, status)
        .api_err("Failed to save attendance")?;

    tracing::info!(class = %class_id, %date, marked, "bulk attendance saved");

    Ok::<_, ApiError>(Json(ApiResponse::success(BulkAttendanceResponse {
        date,
        status: status.as_str().to_string(),
        marked,
    })))
}

pub async fn attendance_history(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
    ApiQuery(params): ApiQuery<DateRangeParams>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, ATTENDANCE_READ)?;

    let from = parse_date(&params.from)?;
    let to = parse_date(&params.to)?;
    if from > to {
        return Err(ApiError::bad_request("'from' must not be after 'to'"));
    }

    state
        .store
        .get_class_slot(&class_id)
        .api_err("Failed to get class")?
        .ok_or_else(|| ApiError::not_found("Class not found"))?;

    let records = state
        .store
        .list_attendance(&class_id, from, to)
        .api_err("Failed to load attendance history")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(records)))
}
