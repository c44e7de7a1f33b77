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
use crate::server::dto::{CreateClassRequest, ScheduleDay, ScheduleParams, UpdateClassRequest};
use crate::server::response::{
    ApiError, ApiJson, ApiQuery, ApiResponse, StoreOptionExt, StoreResultExt,
};
use crate::server::validation::validate_required;
use crate::types::permission::{CLASSES_READ, CLASSES_WRITE};
use crate::types::{
    ClassSlot, ClassSlotFilter, FIRST_CLASS_DAY, LAST_CLASS_DAY, TimeOfDay, day_name,
};

pub async fn list_classes(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<ClassSlotFilter>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, CLASSES_READ)?;

    let classes = state
        .store
        .list_class_slots(&filter)
        .api_err("Failed to list classes")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(classes)))
}

pub async fn get_class(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, CLASSES_READ)?;

    let class = state
        .store
        .get_class_slot(&id)
        .api_err("Failed to get class")?
        .or_not_found("Class not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(class)))
}

/// Creates a weekly class. Overlaps with another class of the same teacher
/// on the same day are rejected with 409.
pub async fn create_class(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateClassRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, CLASSES_WRITE)?;

    let now = Utc::now();
    let class = ClassSlot {
        id: Uuid::new_v4().to_string(),
        name: validate_required(&req.name, "Class name")?,
        teacher_id: req.teacher_id,
        book_id: req.book_id,
        unit_id: req.unit_id,
        day_of_week: req.day_of_week,
        start_time: TimeOfDay::parse(&req.start_time)?,
        end_time: TimeOfDay::parse(&req.end_time)?,
        room: req.room,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .create_class_slot(&class)
        .api_err("Failed to create class")?;

    tracing::info!(
        class = %class.id,
        teacher = %class.teacher_id,
        day = class.day_of_week,
        "class created"
    );

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(class))))
}

pub async fn update_class(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateClassRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, CLASSES_WRITE)?;

    let mut class = state
        .store
        .get_class_slot(&id)
        .api_err("Failed to get class")?
        .or_not_found("Class not found")?;

    if let Some(name) = req.name {
        class.name = validate_required(&name, "Class name")?;
    }
    if let Some(teacher_id) = req.teacher_id {
        class.teacher_id = teacher_id;
    }
    if let Some(book_id) = req.book_id {
        class.book_id = book_id;
    }
    if let Some(unit_id) = req.unit_id {
        class.unit_id = unit_id;
    }
    if let Some(day) = req.day_of_week {
        class.day_of_week = day;
    }
    if let Some(start) = req.start_time {
        class.start_time = TimeOfDay::parse(&start)?;
    }
    if let Some(end) = req.end_time {
        class.end_time = TimeOfDay::parse(&end)?;
    }
    if req.room.is_some() {
        class.room = req.room;
    }
    class.updated_at = Utc::now();

    state
        .store
        .update_class_slot(&class)
        .api_err("Failed to update class")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(class)))
}

pub async fn delete_class(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, CLASSES_WRITE)?;

    let deleted = state
        .store
        .delete_class_slot(&id)
        .api_err("Failed to delete class")?;

    if !deleted {
        return Err(ApiError::not_found("Class not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

/// Monday to Saturday, each day with its classes ordered by start time.
pub async fn weekly_schedule(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ScheduleParams>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, CLASSES_READ)?;

    let filter = ClassSlotFilter {
        teacher_id: params.teacher_id,
        unit_id: params.unit_id,
        day_of_week: None,
    };
    let classes = state
        .store
        .list_class_slots(&filter)
        .api_err("Failed to load schedule")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(group_by_day(classes))))
}

fn group_by_day(classes: Vec<ClassSlot>) -> Vec<ScheduleDay> {
    let mut days: Vec<ScheduleDay> = (FIRST_CLASS_DAY..=LAST_CLASS_DAY)
        .map(|day| ScheduleDay {
            day_of_week: day,
            day_name: day_name(day),
            classes: Vec::new(),
        })
        .collect();

    for class in classes {
        let idx = usize::from(class.day_of_week.saturating_sub(FIRST_CLASS_DAY));
        if let Some(day) = days.get_mut(idx) {
            day.classes.push(class);
        }
    }
    for day in &mut days {
        day.classes.sort_by_key(|c| c.start_time);
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(day: u8, start: &str) -> ClassSlot {
        ClassSlot {
            id: format!("{day}-{start}"),
            name: "Journey".to_string(),
            teacher_id: "t".to_string(),
            book_id: "b".to_string(),
            unit_id: "u".to_string(),
            day_of_week: day,
            start_time: TimeOfDay::parse(start).unwrap(),
            end_time: TimeOfDay::parse("23:00").unwrap(),
            room: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_by_day() {
        let days = group_by_day(vec![class(3, "18:00"), class(1, "10:00"), class(3, "08:30")]);

        assert_eq!(days.len(), 6);
        assert_eq!(days[0].day_name, "Monday");
        assert_eq!(days[0].classes.len(), 1);
        assert!(days[1].classes.is_empty());

        let wednesday: Vec<_> = days[2]
            .classes
            .iter()
            .map(|c| c.start_time.to_string())
            .collect();
        assert_eq!(wednesday, vec!["08:30", "18:00"]);
    }
}
