//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{BackendKind, Config};
use crate::errors::AppResult;
use crate::infra::{
    Backend, Database, ErrorLog, FileStorage, LocalFileStorage, LogMailer, MemoryBackend,
    MemorySessionStore, Persistence, RedisSessionStore, SessionStore,
};
use crate::services::{ServiceContainer, Services};

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
    /// Also backs rate limiting
    pub sessions: Arc<dyn SessionStore>,
    pub storage: Arc<dyn FileStorage>,
    pub error_log: ErrorLog,
    /// Health checks only; handlers go through the services
    pub backend: Arc<dyn Backend>,
    /// Served at `/uploads`
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(
        services: Arc<dyn ServiceContainer>,
        sessions: Arc<dyn SessionStore>,
        storage: Arc<dyn FileStorage>,
        error_log: ErrorLog,
        backend: Arc<dyn Backend>,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            services,
            sessions,
            storage,
            error_log,
            backend,
            upload_dir,
        }
    }

    /// Build the state for the configured backend.
    ///
    /// PostgreSQL runs pending migrations on connect; the memory backend
    /// starts from demo data.
    pub async fn from_config(config: Config, error_log: ErrorLog) -> AppResult<Self> {
        match config.backend {
            BackendKind::Postgres => {
                let database = Database::connect(&config).await?;
                let sessions: Arc<dyn SessionStore> =
                    Arc::new(RedisSessionStore::connect(&config).await?);
                let backend = Arc::new(Persistence::new(database));
                Ok(Self::assemble(backend, sessions, config, error_log))
            }
            BackendKind::Memory => Self::in_memory(config, error_log),
        }
    }

    /// Memory backend with demo data and in-process sessions
    pub fn in_memory(config: Config, error_log: ErrorLog) -> AppResult<Self> {
        let backend = Arc::new(MemoryBackend::with_demo_data()?);
        let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        Ok(Self::assemble(backend, sessions, config, error_log))
    }

    fn assemble<B: Backend + 'static>(
        backend: Arc<B>,
        sessions: Arc<dyn SessionStore>,
        config: Config,
        error_log: ErrorLog,
    ) -> Self {
        let storage = Arc::new(LocalFileStorage::new(
            config.upload_dir.clone(),
            config.public_base_url.clone(),
        ));
        let mailer = Arc::new(LogMailer::new(config.smtp_from.clone()));
        let upload_dir = config.upload_dir.clone();
        let services = Arc::new(Services::build(
            backend.clone(),
            sessions.clone(),
            mailer,
            config,
        ));

        Self::new(services, sessions, storage, error_log, backend, upload_dir)
    }
}
