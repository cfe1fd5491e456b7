//! Subscription service - Membership status and subscribing.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::infra::Backend;
use domain::{DomainError, Subscription, SubscriptionOffer, User};

/// Membership status shown on the subscription page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionStatusView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
    pub active: bool,
    pub offer: SubscriptionOffer,
}

impl SubscriptionStatusView {
    pub fn for_user(user: &User) -> Self {
        Self {
            subscription: user.subscription.clone(),
            active: user.has_active_subscription(Utc::now()),
            offer: SubscriptionOffer::current(),
        }
    }
}

/// Subscription service trait for dependency injection.
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    async fn status(&self, user_id: Uuid) -> AppResult<SubscriptionStatusView>;

    /// Buy the annual plan. Fails with `AlreadySubscribed` while a
    /// subscription is active, without writing anything.
    async fn subscribe(&self, user_id: Uuid, payment_method: Option<String>)
        -> AppResult<Subscription>;
}

/// Concrete implementation of SubscriptionService.
pub struct SubscriptionManager<B: Backend> {
    backend: Arc<B>,
}

impl<B: Backend> SubscriptionManager<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    async fn load(&self, user_id: Uuid) -> AppResult<User> {
        self.backend
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound.into())
    }
}

#[async_trait]
impl<B: Backend> SubscriptionService for SubscriptionManager<B> {
    async fn status(&self, user_id: Uuid) -> AppResult<SubscriptionStatusView> {
        let user = self.load(user_id).await?;
        Ok(SubscriptionStatusView::for_user(&user))
    }

    #[tracing::instrument(skip(self))]
    async fn subscribe(
        &self,
        user_id: Uuid,
        payment_method: Option<String>,
    ) -> AppResult<Subscription> {
        let user = self.load(user_id).await?;
        let now = Utc::now();

        let subscription = domain::subscribe(&user, now, payment_method.as_deref())?;
        self.backend
            .users()
            .set_subscription(user_id, subscription.clone(), now)
            .await?;

        tracing::info!(user_id = %user_id, end_date = %subscription.end_date, "Subscribed");
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::services::testing::{guest, member, TestBackend};
    use domain::{SubscriptionPlan, SubscriptionStatus, ANNUAL_PLAN_PRICE};

    #[tokio::test]
    async fn test_subscribe_persists_annual_plan() {
        let user = guest("Ada");
        let user_id = user.id;
        let mut backend = TestBackend::default();
        let stored = user.clone();
        backend
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        backend
            .users
            .expect_set_subscription()
            .withf(move |id, s, _| *id == user_id && s.price == ANNUAL_PLAN_PRICE)
            .times(1)
            .returning(move |_, s, _| {
                let mut stored = guest("Ada");
                stored.subscription = Some(s);
                Ok(stored)
            });

        let service = SubscriptionManager::new(backend.build());
        let subscription = service.subscribe(user.id, None).await.unwrap();

        assert_eq!(subscription.plan, SubscriptionPlan::Annual);
        assert_eq!(subscription.status, SubscriptionStatus::Active);
        assert_eq!(subscription.price, ANNUAL_PLAN_PRICE);
        assert_eq!(subscription.payment_method, "card");
        assert!(subscription.auto_renewal);
    }

    #[tokio::test]
    async fn test_active_member_cannot_subscribe_again() {
        let user = member("Marco");
        let mut backend = TestBackend::default();
        let stored = user.clone();
        backend
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        backend.users.expect_set_subscription().never();

        let service = SubscriptionManager::new(backend.build());
        let result = service.subscribe(user.id, Some("paypal".into())).await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::AlreadySubscribed))
        ));
    }

    #[tokio::test]
    async fn test_status_reports_offer_for_non_member() {
        let user = guest("Ada");
        let mut backend = TestBackend::default();
        let stored = user.clone();
        backend
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));

        let service = SubscriptionManager::new(backend.build());
        let view = service.status(user.id).await.unwrap();

        assert!(!view.active);
        assert!(view.subscription.is_none());
        assert_eq!(view.offer, SubscriptionOffer::current());
    }
}
