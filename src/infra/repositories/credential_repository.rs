//! Identity store: credentials and password reset tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};
use uuid::Uuid;

use super::entities::{credential, password_reset};
use crate::errors::{AppError, AppResult, IdentityError};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Email/password credential of one account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub user_id: Uuid,
    /// Always lowercased
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// Don't expose hash in debug output
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Outstanding reset request. Only the token's hash is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    pub token_hash: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Credential repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Credential>>;

    /// Fails with `EmailInUse` when the email is taken
    async fn create(&self, credential: Credential) -> AppResult<Credential>;

    /// Drop the account's credential. Missing credentials are not an error.
    async fn delete(&self, user_id: Uuid) -> AppResult<()>;

    async fn update_password(&self, user_id: Uuid, password_hash: String) -> AppResult<()>;

    async fn store_reset(&self, reset: PasswordReset) -> AppResult<()>;

    /// Remove and return the reset record, so each token works once
    async fn take_reset(&self, token_hash: &str) -> AppResult<Option<PasswordReset>>;
}

/// PostgreSQL implementation of CredentialRepository
pub struct CredentialStore {
    db: DatabaseConnection,
}

impl CredentialStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialRepository for CredentialStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Credential>> {
        let result = credential::Entity::find()
            .filter(credential::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Credential::from))
    }

    async fn create(&self, credential: Credential) -> AppResult<Credential> {
        let model = credential::ActiveModel {
            user_id: Set(credential.user_id),
            email: Set(credential.email),
            password_hash: Set(credential.password_hash),
            created_at: Set(credential.created_at),
        }
        .insert(&self.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => IdentityError::EmailInUse.into(),
            _ => AppError::from(e),
        })?;

        Ok(Credential::from(model))
    }

    async fn delete(&self, user_id: Uuid) -> AppResult<()> {
        credential::Entity::delete_by_id(user_id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn update_password(&self, user_id: Uuid, password_hash: String) -> AppResult<()> {
        let result = credential::Entity::update_many()
            .set(credential::ActiveModel {
                password_hash: Set(password_hash),
                ..Default::default()
            })
            .filter(credential::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn store_reset(&self, reset: PasswordReset) -> AppResult<()> {
        password_reset::ActiveModel {
            token_hash: Set(reset.token_hash),
            user_id: Set(reset.user_id),
            expires_at: Set(reset.expires_at),
        }
        .insert(&self.db)
        .await
        .map_err(AppError::from)?;

        Ok(())
    }

    async fn take_reset(&self, token_hash: &str) -> AppResult<Option<PasswordReset>> {
        let Some(model) = password_reset::Entity::find_by_id(token_hash.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let result = password_reset::Entity::delete_by_id(token_hash.to_string())
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        // A concurrent redemption already consumed it
        if result.rows_affected == 0 {
            return Ok(None);
        }
        Ok(Some(PasswordReset::from(model)))
    }
}
