//! Liveness and readiness.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/health", get(health))
}

async fn ping() -> impl IntoResponse {
    Json(json!({ "message": "pong" }))
}

/// 200 when the database answers, 503 otherwise.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    if !state.db.health_check().await {
        warn!("Health check failed: database unreachable");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "database": "unreachable" })),
        );
    }

    let migrations = match state.db.migration_status().await {
        Ok((total, applied)) => json!({ "total": total, "applied": applied }),
        Err(e) => {
            warn!(error = %e, "Could not read migration status");
            serde_json::Value::Null
        }
    };

    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "database": "ok", "migrations": migrations })),
    )
}
