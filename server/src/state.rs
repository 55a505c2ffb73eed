use std::sync::Arc;

use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::session::SessionStore;
use crate::config::Config;
use crate::db;
use crate::models::user::{ProvisionError, User};
use crate::seed;
use crate::utils::upload::UploadStore;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to run migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Admin(#[from] ProvisionError),
}

/// Everything a handler needs, built once at startup and handed to the
/// router.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub uploads: UploadStore,
    /// Owner of the curated events shown to every viewer.
    pub admin_id: Uuid,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config, admin_id: Uuid) -> Self {
        Self {
            sessions: SessionStore::new(config.session_ttl),
            uploads: UploadStore::new(config.upload_dir.clone()),
            config: Arc::new(config),
            pool,
            admin_id,
        }
    }

    /// Opens the database, applies migrations and makes sure the
    /// administrator account exists before anything is served.
    pub async fn bootstrap(config: Config) -> Result<Self, StartupError> {
        let pool = db::connect(&config.database_url, config.max_connections).await?;
        tracing::info!("Successfully connected to database");

        db::migrate(&pool).await?;
        tracing::info!("Migrations run successfully");

        let admin = User::ensure_admin(&pool, &config.admin).await?;

        if config.seed_demo_events {
            let inserted = seed::seed_demo_events(&pool, admin.id).await?;
            tracing::info!(inserted, "Demo events seeded");
        }

        Ok(Self::new(pool, config, admin.id))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"<Config>")
            .field("sessions", &self.sessions)
            .field("uploads", &self.uploads)
            .field("admin_id", &self.admin_id)
            .finish()
    }
}
