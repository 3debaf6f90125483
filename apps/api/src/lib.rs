//! # Stockroom API
//!
//! REST server for the warehouse web client.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Stockroom API                                  │
//! │                                                                         │
//! │  Client ──► TraceLayer ──► TimeoutLayer ──► CORS ──► Router             │
//! │                                                        │                │
//! │             ┌──────────────────────────────────────────┤                │
//! │             ▼                    ▼                     ▼                │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │  AuthUser        │  │  Handlers        │  │  /uploads            │  │
//! │  │  (JWT → role)    │  │  routes::*       │  │  (ServeDir)          │  │
//! │  └──────────────────┘  └────────┬─────────┘  └──────────────────────┘  │
//! │                                 ▼                                       │
//! │                  ┌──────────────────────────────┐                       │
//! │                  │  stockroom-db (SQLite)       │                       │
//! │                  │  ImageStore  ·  xlsx renderer│                       │
//! │                  └──────────────────────────────┘                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. Every key can be overridden with a
//! `STOCKROOM_*` environment variable, e.g. `STOCKROOM_JWT_SECRET`.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod images;
pub mod report;
pub mod response;
pub mod routes;
pub mod state;

use axum::Router;
use stockroom_core::{Role, User};
use stockroom_db::{Database, NewUser};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the full application with middleware.
pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);
    let timeout = state.config.request_timeout();

    routes::routes()
        .with_state(state)
        .nest_service("/uploads", uploads)
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
}

/// Creates the configured admin when the user table is empty.
///
/// ## Returns
/// * `Ok(Some(user))` - Admin was created
/// * `Ok(None)` - No credentials configured, or users already exist
pub async fn bootstrap_admin(db: &Database, config: &ApiConfig) -> ApiResult<Option<User>> {
    let Some((username, password)) = config.bootstrap_admin() else {
        return Ok(None);
    };

    let existing = db.users().count().await?;
    if existing > 0 {
        debug!(existing, "Users present, skipping admin bootstrap");
        return Ok(None);
    }

    let user = db
        .users()
        .create(NewUser {
            username: username.to_string(),
            password_hash: auth::hash_password(password)?,
            full_name: "Administrator".to_string(),
            role: Role::Admin,
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "Bootstrap admin created");
    Ok(Some(user))
}

// =============================================================================
// HTTP Tests
// =============================================================================
