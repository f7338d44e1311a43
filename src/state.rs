use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::video::VideoCatalog;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub video: Arc<dyn VideoCatalog>,
}
