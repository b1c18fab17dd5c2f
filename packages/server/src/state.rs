use std::sync::Arc;

use common::DiskVault;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub vault: Arc<DiskVault>,
    pub config: Arc<AppConfig>,
}
