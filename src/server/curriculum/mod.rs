mod books;
mod courses;
mod units;
mod videos;

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::server::AppState;

pub fn curriculum_router() -> Router<Arc<AppState>> {
    Router::new()
        // Courses
        .route("/courses", get(courses::list_courses).post(courses::create_course))
        .route(
            "/courses/{id}",
            get(courses::get_course)
                .patch(courses::update_course)
                .delete(courses::delete_course),
        )
        // Books
        .route(
            "/courses/{id}/books",
            get(books::list_books).post(books::create_book),
        )
        .route(
            "/books/{id}",
            get(books::get_book)
                .patch(books::update_book)
                .delete(books::delete_book),
        )
        // Course units
        .route(
            "/books/{id}/units",
            get(units::list_units).post(units::create_unit),
        )
        .route(
            "/course-units/{id}",
            get(units::get_unit)
                .patch(units::update_unit)
                .delete(units::delete_unit),
        )
        // Videos and activities
        .route(
            "/course-units/{id}/videos",
            get(videos::list_videos).post(videos::create_video),
        )
        .route(
            "/videos/{id}",
            get(videos::get_video)
                .patch(videos::update_video)
                .delete(videos::delete_video),
        )
        .route(
            "/videos/{id}/activity",
            get(videos::get_activity).put(videos::put_activity),
        )
}
