mod staff;
mod students;
mod units;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::server::AppState;

pub fn directory_router() -> Router<Arc<AppState>> {
    Router::new()
        // School units
        .route("/units", get(units::list_units))
        .route("/units", post(units::create_unit))
        .route("/units/{id}", get(units::get_unit))
        .route("/units/{id}", patch(units::update_unit))
        .route("/units/{id}", delete(units::delete_unit))
        // Staff
        .route("/staff", get(staff::list_staff))
        .route("/staff", post(staff::create_staff))
        .route("/staff/{id}", get(staff::get_staff))
        .route("/staff/{id}", patch(staff::update_staff))
        .route("/staff/{id}", delete(staff::delete_staff))
        // Students
        .route("/students", get(students::list_students))
        .route("/students", post(students::create_student))
        .route("/students/{id}", get(students::get_student))
        .route("/students/{id}", patch(students::update_student))
        .route("/students/{id}", delete(students::delete_student))
        // Login accounts
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user))
}
