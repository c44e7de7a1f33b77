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
use crate::server::dto::{CreateBookRequest, UpdateBookRequest};
use crate::server::response::{ApiError, ApiJson, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_color, validate_required};
use crate::types::Book;
use crate::types::permission::{COURSES_READ, COURSES_WRITE};

pub async fn list_books(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_READ)?;

    state
        .store
        .get_course(&course_id)
        .api_err("Failed to get course")?
        .or_not_found("Course not found")?;

    let books = state
        .store
        .list_books(&course_id)
        .api_err("Failed to list books")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(books)))
}

pub async fn get_book(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_READ)?;

    let book = state
        .store
        .get_book(&id)
        .api_err("Failed to get book")?
        .or_not_found("Book not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(book)))
}

pub async fn create_book(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
    ApiJson(req): ApiJson<CreateBookRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_WRITE)?;

    if let Some(color) = &req.color {
        validate_color(color)?;
    }

    let book = Book {
        id: Uuid::new_v4().to_string(),
        course_id,
        title: validate_required(&req.title, "Title")?,
        display_order: req.display_order,
        color: req.color,
    };

    state
        .store
        .create_book(&book)
        .api_err("Failed to create book")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(book))))
}

pub async fn update_book(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateBookRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_WRITE)?;

    let mut book = state
        .store
        .get_book(&id)
        .api_err("Failed to get book")?
        .or_not_found("Book not found")?;

    if let Some(title) = req.title {
        book.title = validate_required(&title, "Title")?;
    }
    if let Some(order) = req.display_order {
        book.display_order = order;
    }
    if let Some(color) = req.color {
        validate_color(&color)?;
        book.color = Some(color);
    }

    state
        .store
        .update_book(&book)
        .api_err("Failed to update book")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(book)))
}

pub async fn delete_book(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &auth.user, COURSES_WRITE)?;

    let deleted = state
        .store
        .delete_book(&id)
        .api_err("Failed to delete book")?;

    if !deleted {
        return Err(ApiError::not_found("Book not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
