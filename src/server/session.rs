use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{RequireAuth, TokenGenerator, verify_password};
use crate::error::Error;
use crate::server::AppState;
use crate::server::access::effective_permissions;
use crate::server::dto::{LoginRequest, LoginResponse, MeResponse};
use crate::server::response::{ApiError, ApiJson, ApiResponse, StoreResultExt};
use crate::types::Token;

const MAX_LOOKUP_RETRIES: usize = 3;

pub fn session_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> impl IntoResponse {
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let user = state
        .store
        .get_user_by_email(req.email.trim())
        .api_err("Failed to look up user")?
        .ok_or_else(invalid)?;

    let matches = verify_password(&req.password, &user.password_hash).unwrap_or_else(|e| {
        tracing::warn!(user = %user.id, "Unverifiable password hash: {e}");
        false
    });
    if !matches {
        return Err(invalid());
    }

    let generator = TokenGenerator::new();
    let now = Utc::now();
    let expires_at = now + Duration::hours(state.session_ttl_hours);

    // Lookups are 8 random hex chars; retry the rare collision.
    let mut attempt = 0;
    let raw_token = loop {
        let (raw_token, lookup, hash) = generator
            .generate()
            .api_err("Failed to generate token")?;

        let token = Token {
            id: Uuid::new_v4().to_string(),
            token_hash: hash,
            token_lookup: lookup,
            user_id: user.id.clone(),
            created_at: now,
            expires_at: Some(expires_at),
            last_used_at: None,
        };

        match state.store.create_token(&token) {
            Ok(()) => break raw_token,
            Err(Error::TokenLookupCollision) if attempt + 1 < MAX_LOOKUP_RETRIES => attempt += 1,
            Err(e) => {
                tracing::error!("Failed to store token: {e}");
                return Err(ApiError::internal("Failed to create session"));
            }
        }
    };

    tracing::info!(user = %user.id, "user logged in");

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(LoginResponse {
            token: raw_token,
            expires_at,
            user,
        })),
    ))
}

pub async fn me(auth: RequireAuth, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.as_ref();
    let permissions =
        effective_permissions(store, &auth.user).api_err("Failed to resolve permissions")?;
    let staff = store
        .get_staff_by_user(&auth.user.id)
        .api_err("Failed to load staff profile")?;
    let student = store
        .get_student_by_user(&auth.user.id)
        .api_err("Failed to load student profile")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(MeResponse {
        user: auth.user,
        permissions: permissions.to_strings(),
        staff,
        student,
    })))
}

pub async fn logout(auth: RequireAuth, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state
        .store
        .delete_token(&auth.token.id)
        .api_err("Failed to delete token")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
