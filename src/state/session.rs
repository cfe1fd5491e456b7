//! Identity and subscription state for one client session.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::tracked;
use crate::errors::{AppError, AppResult};
use crate::infra::ErrorLog;
use crate::services::{ServiceContainer, Session};
use domain::{event_price, has_active_subscription, ProfileUpdate, Subscription, User};

/// Current session and user, refetched after every write.
pub struct SessionState {
    services: Arc<dyn ServiceContainer>,
    error_log: ErrorLog,
    current: RwLock<Option<Session>>,
}

impl SessionState {
    pub fn new(services: Arc<dyn ServiceContainer>, error_log: ErrorLog) -> Self {
        Self {
            services,
            error_log,
            current: RwLock::new(None),
        }
    }

    /// Create an account and sign straight into it
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> AppResult<User> {
        let result = self
            .services
            .auth()
            .create_account(email.to_string(), password.to_string(), name.to_string())
            .await;
        tracked(&self.error_log, result)?;

        self.sign_in(email, password).await
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<User> {
        let result = self
            .services
            .auth()
            .authenticate(email.to_string(), password.to_string())
            .await;
        let session = tracked(&self.error_log, result)?;
        let user = session.user.clone();

        *self.current.write().await = Some(session);
        tracing::info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    /// Clears the local session even if the backend call fails
    pub async fn sign_out(&self) -> AppResult<()> {
        let Some(session) = self.current.write().await.take() else {
            return Ok(());
        };

        let result = self.services.auth().end_session(session.id).await;
        tracked(&self.error_log, result)?;
        tracing::info!(user_id = %session.user.id, "Signed out");
        Ok(())
    }

    pub async fn send_password_reset(&self, email: &str) -> AppResult<()> {
        let result = self
            .services
            .auth()
            .send_password_reset(email.to_string())
            .await;
        tracked(&self.error_log, result)
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let result = self
            .services
            .auth()
            .reset_password(token.to_string(), new_password.to_string())
            .await;
        tracked(&self.error_log, result)
    }

    /// Refetch the signed-in user's profile
    pub async fn refresh(&self) -> AppResult<Option<User>> {
        let Some(user_id) = self.user_id().await else {
            return Ok(None);
        };

        let result = self.services.users().get_profile(user_id).await;
        let user = tracked(&self.error_log, result)?;

        if let Some(session) = self.current.write().await.as_mut() {
            session.user = user.clone();
        }
        Ok(Some(user))
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> AppResult<User> {
        let user_id = self.require_user_id().await?;

        let result = self.services.users().update_profile(user_id, update).await;
        tracked(&self.error_log, result)?;
        self.refresh().await?.ok_or(AppError::Unauthorized)
    }

    /// Buy the annual plan for the signed-in user
    pub async fn subscribe(&self, payment_method: Option<&str>) -> AppResult<Subscription> {
        let user_id = self.require_user_id().await?;

        let result = self
            .services
            .subscriptions()
            .subscribe(user_id, payment_method.map(str::to_string))
            .await;
        let subscription = tracked(&self.error_log, result)?;
        self.refresh().await?;
        Ok(subscription)
    }

    pub async fn current_user(&self) -> Option<User> {
        self.current.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn user_id(&self) -> Option<Uuid> {
        self.current.read().await.as_ref().map(|s| s.user.id)
    }

    pub async fn access_token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub async fn is_admin(&self) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.user.is_admin)
    }

    pub async fn is_subscribed(&self) -> bool {
        let current = self.current.read().await;
        has_active_subscription(current.as_ref().map(|s| &s.user), Utc::now())
    }

    /// What the signed-in user pays for an event at `base_price`
    pub async fn price_for(&self, base_price: f64) -> f64 {
        let current = self.current.read().await;
        event_price(base_price, current.as_ref().map(|s| &s.user), Utc::now())
    }

    async fn require_user_id(&self) -> AppResult<Uuid> {
        self.user_id().await.ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::IdentityError;
    use crate::infra::{DEMO_GUEST_EMAIL, DEMO_MEMBER_EMAIL, DEMO_PASSWORD};
    use crate::state::testing::{demo_services, error_log};
    use domain::{DomainError, SubscriptionStatus};

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let state = SessionState::new(demo_services(), error_log());
        assert!(state.current_user().await.is_none());

        let user = state.sign_in(DEMO_MEMBER_EMAIL, DEMO_PASSWORD).await.unwrap();
        assert_eq!(user.email, DEMO_MEMBER_EMAIL);
        assert!(state.access_token().await.is_some());
        assert!(state.is_subscribed().await);

        state.sign_out().await.unwrap();
        assert!(state.current_user().await.is_none());
        assert!(!state.is_subscribed().await);
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_state_signed_out() {
        let state = SessionState::new(demo_services(), error_log());

        let result = state.sign_in(DEMO_MEMBER_EMAIL, "not-the-password").await;
        assert!(matches!(
            result,
            Err(AppError::Identity(IdentityError::WrongPassword))
        ));
        assert!(state.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_member_pricing_follows_session() {
        let state = SessionState::new(demo_services(), error_log());
        assert_eq!(state.price_for(150.0).await, 150.0);

        state.sign_in(DEMO_MEMBER_EMAIL, DEMO_PASSWORD).await.unwrap();
        assert_eq!(state.price_for(150.0).await, 120.0);
        assert_eq!(state.price_for(25.0).await, 0.0);
    }

    #[tokio::test]
    async fn test_subscribe_refetches_user() {
        let state = SessionState::new(demo_services(), error_log());
        state.sign_in(DEMO_GUEST_EMAIL, DEMO_PASSWORD).await.unwrap();
        assert!(!state.is_subscribed().await);

        let subscription = state.subscribe(None).await.unwrap();
        assert_eq!(subscription.status, SubscriptionStatus::Active);
        assert_eq!(subscription.price, 197.0);
        assert!(state.is_subscribed().await);

        let again = state.subscribe(Some("paypal")).await;
        assert!(matches!(
            again,
            Err(AppError::Domain(DomainError::AlreadySubscribed))
        ));
    }

    #[tokio::test]
    async fn test_sign_up_signs_in_and_edits_profile() {
        let state = SessionState::new(demo_services(), error_log());

        let user = state
            .sign_up("new@example.com", "longenough1", "Newcomer")
            .await
            .unwrap();
        assert_eq!(state.user_id().await, Some(user.id));

        let updated = state
            .update_profile(ProfileUpdate {
                bio: Some("Loves risotto".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Loves risotto"));
        assert_eq!(
            state.current_user().await.and_then(|u| u.bio).as_deref(),
            Some("Loves risotto")
        );
    }

    #[tokio::test]
    async fn test_writes_require_a_session() {
        let state = SessionState::new(demo_services(), error_log());
        assert!(matches!(
            state.subscribe(None).await,
            Err(AppError::Unauthorized)
        ));
    }
}
