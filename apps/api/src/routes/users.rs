//! User management (admin only).

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;
use stockroom_core::requests::{NewUserRequest, UserChanges};
use stockroom_core::{Operation, Page, User};
use stockroom_db::{NewUser, UserUpdate};
use tracing::info;

use crate::auth::{hash_password, AuthUser};
use crate::error::ApiResult;
use crate::extract::{JsonBody, QueryParams};
use crate::response::ApiResponse;
use crate::routes::ListQuery;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/{id}", get(get_user).put(update_user))
}

async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<ApiResponse<Page<User>>> {
    auth.authorize(Operation::ManageUsers)?;

    let page = state.db.users().list(query.page_request()).await?;
    Ok(ApiResponse::ok("Users retrieved", page))
}

async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<User>> {
    auth.authorize(Operation::ManageUsers)?;

    let user = state.db.users().get(&id).await?;
    Ok(ApiResponse::ok("User retrieved", user))
}

async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<NewUserRequest>,
) -> ApiResult<ApiResponse<User>> {
    auth.authorize(Operation::ManageUsers)?;
    let role = req.validate()?;

    let user = state
        .db
        .users()
        .create(NewUser {
            username: req.username.trim().to_string(),
            password_hash: hash_password(&req.password)?,
            full_name: req.full_name.trim().to_string(),
            role,
        })
        .await?;

    info!(user_id = %user.id, role = %user.role, created_by = %auth.id, "User created");
    Ok(ApiResponse::created("User created", user))
}

/// Partial update; a new password is re-hashed.
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UserChanges>,
) -> ApiResult<ApiResponse<User>> {
    auth.authorize(Operation::ManageUsers)?;
    let role = req.validate()?;

    let password_hash = req.password.as_deref().map(hash_password).transpose()?;

    let user = state
        .db
        .users()
        .update(
            &id,
            UserUpdate {
                username: req.username.as_deref().map(|u| u.trim().to_string()),
                full_name: req.full_name.as_deref().map(|n| n.trim().to_string()),
                password_hash,
                role,
            },
        )
        .await?;

    info!(user_id = %user.id, updated_by = %auth.id, "User updated");
    Ok(ApiResponse::ok("User updated", user))
}
