//! Unit of Work: one handle onto every backend repository.
//!
//! Services depend on [`Backend`] rather than on concrete stores, so the
//! same use cases run against PostgreSQL ([`Persistence`]) and the
//! in-memory backend ([`crate::infra::MemoryBackend`]).

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DatabaseTransaction};
use std::sync::Arc;

use super::db::Database;
use super::repositories::{
    CredentialRepository, CredentialStore, EventRepository, EventStore, RegistrationRepository,
    RegistrationStore, ReviewRepository, ReviewStore, UserRepository, UserStore,
};
use crate::errors::{AppError, AppResult};

/// Backend trait for dependency injection.
///
/// Object safe, so the container can hold it as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn events(&self) -> Arc<dyn EventRepository>;

    fn registrations(&self) -> Arc<dyn RegistrationRepository>;

    fn reviews(&self) -> Arc<dyn ReviewRepository>;

    fn credentials(&self) -> Arc<dyn CredentialRepository>;

    /// Check that the backend answers
    async fn ping(&self) -> AppResult<()>;
}

/// Commit on success, roll back on error.
pub(crate) async fn settle<T>(txn: DatabaseTransaction, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            txn.commit().await.map_err(AppError::from)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

/// PostgreSQL implementation of Backend
pub struct Persistence {
    database: Database,
    user_repo: Arc<UserStore>,
    event_repo: Arc<EventStore>,
    registration_repo: Arc<RegistrationStore>,
    review_repo: Arc<ReviewStore>,
    credential_repo: Arc<CredentialStore>,
}

impl Persistence {
    /// Create new Persistence instance over an open pool
    pub fn new(database: Database) -> Self {
        let db: DatabaseConnection = database.get_connection();
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            event_repo: Arc::new(EventStore::new(db.clone())),
            registration_repo: Arc::new(RegistrationStore::new(db.clone())),
            review_repo: Arc::new(ReviewStore::new(db.clone())),
            credential_repo: Arc::new(CredentialStore::new(db)),
            database,
        }
    }
}

#[async_trait]
impl Backend for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn events(&self) -> Arc<dyn EventRepository> {
        self.event_repo.clone()
    }

    fn registrations(&self) -> Arc<dyn RegistrationRepository> {
        self.registration_repo.clone()
    }

    fn reviews(&self) -> Arc<dyn ReviewRepository> {
        self.review_repo.clone()
    }

    fn credentials(&self) -> Arc<dyn CredentialRepository> {
        self.credential_repo.clone()
    }

    async fn ping(&self) -> AppResult<()> {
        self.database.ping().await.map_err(AppError::from)
    }
}
