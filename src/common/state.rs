use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;

// `DatabaseConnection` is not `Clone` when sea-orm's `mock` feature is
// enabled (as it is for tests), so hold it behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
        }
    }
}
