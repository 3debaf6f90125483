//! Login.

use axum::extract::State;
use axum::routing::post;
use axum::Router;
use serde::Serialize;
use stockroom_core::requests::LoginRequest;
use stockroom_core::User;
use tracing::{info, warn};

use crate::auth::verify_password;
use crate::error::{ApiError, ApiResult};
use crate::extract::JsonBody;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

/// `POST /auth/login`
///
/// Unknown usernames and wrong passwords get the same answer.
async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<ApiResponse<LoginResponse>> {
    req.validate()?;

    let user = state
        .db
        .users()
        .find_by_username(&req.username)
        .await?
        .filter(|user| verify_password(&req.password, &user.password_hash));

    let Some(user) = user else {
        warn!(username = %req.username, "Login failed");
        return Err(ApiError::unauthorized("invalid credentials"));
    };

    let token = state.jwt.generate_token(&user)?;
    info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(ApiResponse::ok(
        "Login successful",
        LoginResponse {
            token,
            token_type: "Bearer",
            expires_in: state.jwt.lifetime_secs(),
            user,
        },
    ))
}
