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
use crate::server::dto::{ActivityRequest, CreateVideoRequest, UpdateVideoRequest};
use crate::server::response::{ApiError, ApiJson, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_required;
use crate::types::permission::{COURSES_READ, COURSES_WRITE};
use crate::types::{ActivityType, CourseActivity, CourseVideo, VideoWithActivity};

fn parse_activity_type(value: &str) -> Result<ActivityType, ApiError> {
    ActivityType::parse(value.trim()).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Invalid activity_type '{value}', expected multiple_choice, fill_blank, matching, ordering, true_false or speaking"
        ))
    })
}

pub async fn list_videos(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(unit_id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_READ)?;

    state
        .store
        .get_course_unit(&unit_id)
        .api_err("Failed to get course unit")?
        .or_not_found("Course unit not found")?;

    let videos = state
        .store
        .list_videos(&unit_id)
        .api_err("Failed to list videos")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(videos)))
}

pub async fn get_video(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_READ)?;

    let video = state
        .store
        .get_video(&id)
        .api_err("Failed to get video")?
        .or_not_found("Video not found")?;
    let activity = state
        .store
        .get_activity_for_video(&video.id)
        .api_err("Failed to get activity")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(VideoWithActivity {
        video,
        activity,
    })))
}

pub async fn create_video(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(unit_id): Path<String>,
    ApiJson(req): ApiJson<CreateVideoRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_WRITE)?;

    let video = CourseVideo {
        id: Uuid::new_v4().to_string(),
        unit_id,
        day_number: req.day_number,
        title: validate_required(&req.title, "Title")?,
        video_url: validate_required(&req.video_url, "Video URL")?,
    };

    state
        .store
        .create_video(&video)
        .api_err("Failed to create video")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(video))))
}

pub async fn update_video(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateVideoRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_WRITE)?;

    let mut video = state
        .store
        .get_video(&id)
        .api_err("Failed to get video")?
        .or_not_found("Video not found")?;

    if let Some(day_number) = req.day_number {
        video.day_number = day_number;
    }
    if let Some(title) = req.title {
        video.title = validate_required(&title, "Title")?;
    }
    if let Some(url) = req.video_url {
        video.video_url = validate_required(&url, "Video URL")?;
    }

    state
        .store
        .update_video(&video)
        .api_err("Failed to update video")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(video)))
}

pub async fn delete_video(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_WRITE)?;

    let deleted = state
        .store
        .delete_video(&id)
        .api_err("Failed to delete video")?;

    if !deleted {
        return Err(ApiError::not_found("Video not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn get_activity(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_READ)?;

    let activity = state
        .store
        .get_activity_for_video(&video_id)
        .api_err("Failed to get activity")?
        .or_not_found("Activity not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(activity)))
}

/// Creates or replaces the single activity attached to a video.
pub async fn put_activity(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    ApiJson(req): ApiJson<ActivityRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_WRITE)?;

    let activity = CourseActivity {
        id: Uuid::new_v4().to_string(),
        video_id,
        activity_type: parse_activity_type(&req.activity_type)?,
        content: req.content,
        correct_answer: req.correct_answer,
    };

    let stored = state
        .store
        .upsert_activity(&activity)
        .api_err("Failed to save activity")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(stored)))
}
