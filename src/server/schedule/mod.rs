mod attendance;
mod classes;
mod enrollments;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub fn schedule_router() -> Router<Arc<AppState>> {
    Router::new()
        // Class slots
        .route("/classes", get(classes::list_classes).post(classes::create_class))
        .route(
            "/classes/{id}",
            get(classes::get_class)
                .patch(classes::update_class)
                .delete(classes::delete_class),
        )
        .route("/schedule", get(classes::weekly_schedule))
        // Enrollments
        .route(
            "/classes/{id}/enrollments",
            get(enrollments::list_enrollments).post(enrollments::enroll_student),
        )
        .route(
            "/classes/{id}/enrollments/{student_id}",
            delete(enrollments::end_enrollment),
        )
        // Attendance
        .route(
            "/classes/{id}/attendance",
            get(attendance::get_roster).post(attendance::mark_attendance),
        )
        .route(
            "/classes/{id}/attendance/bulk",
            post(attendance::mark_all),
        )
        .route(
            "/classes/{id}/attendance/history",
            get(attendance::attendance_history),
        )
}
