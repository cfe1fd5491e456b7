//! Service Container - Centralized service access with parallel fetch helpers.
//!
//! Depends on service traits, not implementations. Every service shares one
//! [`Backend`], so the same container runs on PostgreSQL or in memory.

use std::future::Future;
use std::sync::Arc;

use super::{
    AuthService, Authenticator, EventManager, EventService, RegistrationManager,
    RegistrationService, ReviewManager, ReviewService, SubscriptionManager, SubscriptionService,
    UserManager, UserService,
};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{Backend, Mailer, SessionStore};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    /// Identity provider: accounts, sessions, password reset
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn subscriptions(&self) -> Arc<dyn SubscriptionService>;

    fn events(&self) -> Arc<dyn EventService>;

    fn registrations(&self) -> Arc<dyn RegistrationService>;

    fn reviews(&self) -> Arc<dyn ReviewService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    subscription_service: Arc<dyn SubscriptionService>,
    event_service: Arc<dyn EventService>,
    registration_service: Arc<dyn RegistrationService>,
    review_service: Arc<dyn ReviewService>,
}

impl Services {
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        subscription_service: Arc<dyn SubscriptionService>,
        event_service: Arc<dyn EventService>,
        registration_service: Arc<dyn RegistrationService>,
        review_service: Arc<dyn ReviewService>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            subscription_service,
            event_service,
            registration_service,
            review_service,
        }
    }

    /// Wire every service over one backend
    pub fn build<B: Backend + 'static>(
        backend: Arc<B>,
        sessions: Arc<dyn SessionStore>,
        mailer: Arc<dyn Mailer>,
        config: Config,
    ) -> Self {
        let auto_promote = config.waitlist_auto_promote;

        Self::new(
            Arc::new(Authenticator::new(backend.clone(), sessions, mailer, config)),
            Arc::new(UserManager::new(backend.clone())),
            Arc::new(SubscriptionManager::new(backend.clone())),
            Arc::new(EventManager::new(backend.clone())),
            Arc::new(RegistrationManager::new(backend.clone(), auto_promote)),
            Arc::new(ReviewManager::new(backend)),
        )
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn subscriptions(&self) -> Arc<dyn SubscriptionService> {
        self.subscription_service.clone()
    }

    fn events(&self) -> Arc<dyn EventService> {
        self.event_service.clone()
    }

    fn registrations(&self) -> Arc<dyn RegistrationService> {
        self.registration_service.clone()
    }

    fn reviews(&self) -> Arc<dyn ReviewService> {
        self.review_service.clone()
    }
}

/// Parallel execution utilities for running independent operations concurrently.
pub mod parallel {
    use super::*;
    use tokio::try_join;

    /// Execute two independent async operations in parallel.
    ///
    /// If either operation fails, the error is returned immediately.
    ///
    /// # Example
    /// ```ignore
    /// let (events, ratings) = parallel::join2(
    ///     backend.events().list(),
    ///     backend.reviews().rating_summaries(),
    /// ).await?;
    /// ```
    pub async fn join2<F1, F2, T1, T2>(f1: F1, f2: F2) -> AppResult<(T1, T2)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
    {
        try_join!(f1, f2)
    }
}
