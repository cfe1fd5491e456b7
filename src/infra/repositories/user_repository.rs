//! User profile repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, SqlErr};
use uuid::Uuid;

use super::entities::user::{
    profile_changes, subscription_changes, ActiveModel, Entity as UserEntity,
};
use crate::errors::{AppError, AppResult, IdentityError};
use domain::{Subscription, User};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Profile documents keyed by the identity-service user id.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Write the profile created at sign-up
    async fn create(&self, user: User) -> AppResult<User>;

    /// Write name, bio, photo and `updated_at` only. Returns the stored
    /// document, so a subscription written meanwhile is kept and reported.
    async fn update_profile(&self, user: User) -> AppResult<User>;

    /// Write the subscription columns only
    async fn set_subscription(
        &self,
        user_id: Uuid,
        subscription: Subscription,
        updated_at: DateTime<Utc>,
    ) -> AppResult<User>;
}

/// PostgreSQL implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn create(&self, user: User) -> AppResult<User> {
        let model = ActiveModel::from(user)
            .insert(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    AppError::from(IdentityError::EmailInUse)
                }
                _ => AppError::from(e),
            })?;

        Ok(User::from(model))
    }

    async fn update_profile(&self, user: User) -> AppResult<User> {
        let model = profile_changes(&user)
            .update(&self.db)
            .await
            .map_err(missing_user)?;

        Ok(User::from(model))
    }

    async fn set_subscription(
        &self,
        user_id: Uuid,
        subscription: Subscription,
        updated_at: DateTime<Utc>,
    ) -> AppResult<User> {
        let model = subscription_changes(user_id, &subscription, updated_at)
            .update(&self.db)
            .await
            .map_err(missing_user)?;

        Ok(User::from(model))
    }
}

fn missing_user(e: DbErr) -> AppError {
    match e {
        DbErr::RecordNotUpdated => AppError::NotFound,
        other => AppError::from(other),
    }
}
