//! HTTP routes.
//!
//! | Prefix | Module |
//! |---|---|
//! | `/ping`, `/health` | [`health`] |
//! | `/auth` | [`auth`] |
//! | `/admin/users` | [`users`] |
//! | `/items` | [`items`] |
//! | `/master-data` | [`master_data`] |
//! | `/transactions` | [`transactions`] |
//! | `/summary` | [`summary`] |
//! | `/reports` | [`reports`] |
//!
//! Every handler except `ping`, `health` and `login` takes an [`AuthUser`]
//! and checks its operation before touching storage.
//!
//! [`AuthUser`]: crate::auth::AuthUser

use axum::Router;
use serde::Deserialize;
use stockroom_core::PageRequest;

use crate::state::AppState;

pub mod auth;
pub mod health;
pub mod items;
pub mod master_data;
pub mod reports;
pub mod summary;
pub mod transactions;
pub mod users;

/// All routes, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(users::routes())
        .merge(items::routes())
        .merge(master_data::routes())
        .merge(transactions::routes())
        .merge(summary::routes())
        .merge(reports::routes())
}

/// `?page=&limit=&search=` shared by the list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn search(&self) -> &str {
        self.search.as_deref().map(str::trim).unwrap_or_default()
    }
}
