use std::sync::Arc;

use anyhow::anyhow;
use tracing::error;

use feedback_db::Database;

use crate::auth::AuthService;
use crate::error::AppError;
use crate::session::SessionConfig;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub auth: AuthService,
    pub sessions: SessionConfig,
}

impl AppStateInner {
    pub fn new(db: Database, auth: AuthService, sessions: SessionConfig) -> AppState {
        Arc::new(Self { db, auth, sessions })
    }
}

/// Run blocking work (SQLite, argon2) off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::Internal(anyhow!("blocking task failed"))
        })?
}
