//! User service - Profile reads and edits.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::infra::Backend;
use domain::{DomainError, ProfileUpdate, User};

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> AppResult<User>;

    /// Apply a partial profile edit and return the stored profile
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AppResult<User>;
}

/// Concrete implementation of UserService.
pub struct UserManager<B: Backend> {
    backend: Arc<B>,
}

impl<B: Backend> UserManager<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: Backend> UserService for UserManager<B> {
    async fn get_profile(&self, id: Uuid) -> AppResult<User> {
        self.backend
            .users()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound.into())
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AppResult<User> {
        update.validate()?;

        let mut user = self.get_profile(id).await?;
        user.apply(update);
        self.backend.users().update_profile(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::services::testing::{guest, TestBackend};

    #[tokio::test]
    async fn test_update_profile_clears_blank_fields() {
        let mut user = guest("Ada");
        user.bio = Some("Old bio".to_string());

        let mut backend = TestBackend::default();
        let stored = user.clone();
        backend
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        backend
            .users
            .expect_update_profile()
            .withf(|u| u.name == "Ada Lovelace" && u.bio.is_none())
            .times(1)
            .returning(Ok);

        let service = UserManager::new(backend.build());
        let updated = service
            .update_profile(
                user.id,
                ProfileUpdate {
                    name: Some(" Ada Lovelace ".to_string()),
                    bio: Some("  ".to_string()),
                    photo_url: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_invalid_profile_edit_writes_nothing() {
        let mut backend = TestBackend::default();
        backend.users.expect_update_profile().never();

        let service = UserManager::new(backend.build());
        let result = service
            .update_profile(
                Uuid::new_v4(),
                ProfileUpdate {
                    name: Some(" ".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let mut backend = TestBackend::default();
        backend.users.expect_find_by_id().returning(|_| Ok(None));

        let service = UserManager::new(backend.build());
        let result = service.get_profile(Uuid::new_v4()).await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::UserNotFound))
        ));
    }
}
