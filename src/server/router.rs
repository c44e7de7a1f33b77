use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::curriculum::curriculum_router;
use super::directory::directory_router;
use super::permissions::permissions_router;
use super::schedule::schedule_router;
use super::session::session_router;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Lifetime of tokens issued by `POST /api/auth/login`.
    pub session_ttl_hours: i64,
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", session_router())
        .nest(
            "/api",
            permissions_router()
                .merge(directory_router())
                .merge(curriculum_router())
                .merge(schedule_router()),
        )
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::store::SqliteStore;

    fn router() -> Router {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        create_router(Arc::new(AppState {
            store: Arc::new(store),
            session_ttl_hours: 24,
        }))
    }

    fn request(method: &str, uri: &str) -> Request {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router().oneshot(request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_require_bearer_token() {
        for uri in ["/api/units", "/api/courses", "/api/classes", "/api/permissions"] {
            let response = router().oneshot(request("GET", uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
            assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
        }
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = router().oneshot(request("GET", "/api/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
