//! Registration service - Member admission and withdrawal.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::infra::Backend;
use domain::{has_active_subscription, DomainError, Registration};

/// Registration service trait for dependency injection.
#[async_trait]
pub trait RegistrationService: Send + Sync {
    /// Register a member. Seats go first come first served; once full the
    /// registration joins the waitlist.
    ///
    /// Fails with `SubscriptionRequired` before any write when the user has
    /// no active subscription.
    async fn register(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Registration>;

    /// Withdraw. `None` when the user was not registered.
    async fn unregister(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<Registration>>;

    /// Oldest first
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Registration>>;

    /// Attendee list, oldest first
    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<Registration>>;
}

/// Concrete implementation of RegistrationService.
pub struct RegistrationManager<B: Backend> {
    backend: Arc<B>,
    auto_promote: bool,
}

impl<B: Backend> RegistrationManager<B> {
    /// `auto_promote` hands a freed seat to the oldest waitlisted entry
    pub fn new(backend: Arc<B>, auto_promote: bool) -> Self {
        Self {
            backend,
            auto_promote,
        }
    }
}

#[async_trait]
impl<B: Backend> RegistrationService for RegistrationManager<B> {
    #[tracing::instrument(skip(self))]
    async fn register(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Registration> {
        let now = Utc::now();
        let user = self.backend.users().find_by_id(user_id).await?;
        if user.is_none() {
            return Err(DomainError::UserNotFound.into());
        }
        if !has_active_subscription(user.as_ref(), now) {
            tracing::warn!("Registration refused: no active subscription");
            return Err(DomainError::SubscriptionRequired.into());
        }

        let event = self
            .backend
            .events()
            .find_by_id(event_id)
            .await?
            .ok_or(DomainError::EventNotFound)?;
        if event.is_past(now) {
            return Err(DomainError::RegistrationClosed.into());
        }

        let registration = self.backend.registrations().admit(event_id, user_id).await?;
        tracing::info!(status = %registration.status, "Registered");
        Ok(registration)
    }

    #[tracing::instrument(skip(self))]
    async fn unregister(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<Registration>> {
        let withdrawal = self
            .backend
            .registrations()
            .withdraw(event_id, user_id, self.auto_promote)
            .await?;

        if let Some(removed) = &withdrawal.removed {
            tracing::info!(status = %removed.status, "Unregistered");
        }
        Ok(withdrawal.removed)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Registration>> {
        self.backend.registrations().list_for_user(user_id).await
    }

    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<Registration>> {
        if self.backend.events().find_by_id(event_id).await?.is_none() {
            return Err(DomainError::EventNotFound.into());
        }
        self.backend.registrations().list_for_event(event_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::services::testing::{guest, member, upcoming_event, TestBackend};
    use chrono::Duration;
    use domain::{RegistrationStatus, Withdrawal};

    fn with_user(backend: &mut TestBackend, user: &domain::User) {
        let stored = user.clone();
        backend
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
    }

    #[tokio::test]
    async fn test_non_member_is_refused_before_any_write() {
        let user = guest("Gina");
        let mut backend = TestBackend::default();
        with_user(&mut backend, &user);
        backend.events.expect_find_by_id().never();
        backend.registrations.expect_admit().never();

        let service = RegistrationManager::new(backend.build(), false);
        let result = service.register(Uuid::new_v4(), user.id).await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::SubscriptionRequired))
        ));
    }

    #[tokio::test]
    async fn test_member_is_admitted_through_gateway() {
        let user = member("Marco");
        let event = upcoming_event(20, 18, 150.0);
        let event_id = event.id;
        let user_id = user.id;

        let mut backend = TestBackend::default();
        with_user(&mut backend, &user);
        backend
            .events
            .expect_find_by_id()
            .returning(move |_| Ok(Some(event.clone())));
        backend
            .registrations
            .expect_admit()
            .withf(move |e, u| *e == event_id && *u == user_id)
            .times(1)
            .returning(|e, u| Ok(Registration::new(e, u, RegistrationStatus::Confirmed)));

        let service = RegistrationManager::new(backend.build(), false);
        let registration = service.register(event_id, user_id).await.unwrap();
        assert_eq!(registration.status, RegistrationStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_past_event_is_closed() {
        let user = member("Marco");
        let mut event = upcoming_event(20, 0, 100.0);
        event.date = Utc::now() - Duration::hours(1);

        let mut backend = TestBackend::default();
        with_user(&mut backend, &user);
        backend
            .events
            .expect_find_by_id()
            .returning(move |_| Ok(Some(event.clone())));
        backend.registrations.expect_admit().never();

        let service = RegistrationManager::new(backend.build(), false);
        let result = service.register(Uuid::new_v4(), user.id).await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::RegistrationClosed))
        ));
    }

    #[tokio::test]
    async fn test_unregister_passes_promotion_switch() {
        let mut backend = TestBackend::default();
        backend
            .registrations
            .expect_withdraw()
            .withf(|_, _, promote| *promote)
            .times(1)
            .returning(|_, _, _| Ok(Withdrawal::none()));

        let service = RegistrationManager::new(backend.build(), true);
        let removed = service
            .unregister(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();
        assert!(removed.is_none());
    }
}
