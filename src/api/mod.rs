//! REST API endpoints.
//!
//! Axum-based read-only HTTP API over the latest published snapshots.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::models::SnapshotScope;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Resolve an optional `scope` query parameter; absent means global.
pub fn resolve_scope(scope: Option<&str>) -> Result<SnapshotScope, ApiError> {
    match scope {
        None | Some("") => Ok(SnapshotScope::Global),
        Some(key) => SnapshotScope::from_key(key)
            .ok_or_else(|| ApiError::BadRequest(format!("invalid scope '{}'", key))),
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(AllowOrigin::exact(value)),
        Err(_) => {
            warn!("Ignoring invalid CORS origin '{}', allowing any", origin);
            layer.allow_origin(Any)
        }
    }
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origin);

    Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/snapshots", get(routes::snapshots::list_snapshots))
        .route("/api/snapshots/:scope", get(routes::snapshots::get_snapshot))
        .route("/api/matchups/:deck_a/:deck_b", get(routes::matchups::get_matchup))
        .route("/api/cards/:card_id", get(routes::cards::get_card))
        .route("/api/leaders/:leader_id", get(routes::leaders::get_leader))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_resolve_scope() {
        assert_eq!(resolve_scope(None).unwrap(), SnapshotScope::Global);
        assert_eq!(resolve_scope(Some("")).unwrap(), SnapshotScope::Global);
        assert_eq!(
            resolve_scope(Some("tournament-t-1")).unwrap(),
            SnapshotScope::Tournament { id: "t-1".into() }
        );
        assert!(matches!(
            resolve_scope(Some("weekly")),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_not_found_error_body() {
        let app = build_router(empty_state());
        let (status, json) = get_json(app, "/api/snapshots/global").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json["error"]["message"].as_str().unwrap().contains("global"));
    }

    #[tokio::test]
    async fn test_bad_scope_error_body() {
        let app = build_router(test_state());
        let (status, json) = get_json(app, "/api/cards/SOR-101?scope=weekly").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = build_router(test_state());
        let (status, _) = get_json(app, "/api/nothing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
