//! Shared application state.

use std::sync::Arc;

use stockroom_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use crate::images::{ImageStore, LocalImageStore};

/// Long-lived handles built once at startup and cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub images: Arc<dyn ImageStore>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Builds state with the local image store from `config`.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(&config.jwt_secret, config.jwt_lifetime_secs);
        let images = Arc::new(LocalImageStore::new(
            &config.upload_dir,
            &config.public_base_url,
        ));

        AppState {
            db,
            jwt,
            images,
            config: Arc::new(config),
        }
    }

    /// Replaces the image store.
    pub fn with_image_store(mut self, images: Arc<dyn ImageStore>) -> Self {
        self.images = images;
        self
    }
}
