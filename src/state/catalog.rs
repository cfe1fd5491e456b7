//! Catalog, registration and review state for one client session.

use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{tracked, SessionState};
use crate::errors::{AppError, AppResult};
use crate::infra::ErrorLog;
use crate::services::{parallel, EventView, ServiceContainer};
use domain::{DomainError, Event, EventUpdate, NewEvent, Registration, Review};

/// What one viewer currently sees. Replaced whole on every refresh.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    /// Soonest first, priced for the viewer
    pub events: Vec<EventView>,
    pub my_registrations: Vec<Registration>,
    /// Filled for admins only
    pub pending_reviews: Vec<Review>,
}

pub struct CatalogState {
    services: Arc<dyn ServiceContainer>,
    session: Arc<SessionState>,
    error_log: ErrorLog,
    snapshot: RwLock<CatalogSnapshot>,
}

impl CatalogState {
    pub fn new(
        services: Arc<dyn ServiceContainer>,
        session: Arc<SessionState>,
        error_log: ErrorLog,
    ) -> Self {
        Self {
            services,
            session,
            error_log,
            snapshot: RwLock::new(CatalogSnapshot::default()),
        }
    }

    /// Refetch everything the viewer can see
    pub async fn refresh(&self) -> AppResult<()> {
        let viewer = self.session.current_user().await;

        let event_service = self.services.events();
        let registration_service = self.services.registrations();
        let review_service = self.services.reviews();

        let events = event_service.list_events(viewer.as_ref());
        let registrations = async {
            match &viewer {
                Some(user) => registration_service.list_for_user(user.id).await,
                None => Ok(Vec::new()),
            }
        };
        let pending = async {
            match &viewer {
                Some(user) if user.is_admin => review_service.pending_reviews().await,
                _ => Ok(Vec::new()),
            }
        };

        let result = parallel::join2(parallel::join2(events, registrations), pending).await;
        let ((events, my_registrations), pending_reviews) = tracked(&self.error_log, result)?;

        *self.snapshot.write().await = CatalogSnapshot {
            events,
            my_registrations,
            pending_reviews,
        };
        Ok(())
    }

    /// Refetch after a committed write. The write's outcome stands even when
    /// this fails; the failure is already in the error log.
    async fn refetch(&self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(code = e.code(), "Refetch after write failed, snapshot is stale");
        }
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn events(&self) -> Vec<EventView> {
        self.snapshot.read().await.events.clone()
    }

    pub async fn event(&self, id: Uuid) -> Option<EventView> {
        self.snapshot
            .read()
            .await
            .events
            .iter()
            .find(|view| view.event.id == id)
            .cloned()
    }

    pub async fn my_registrations(&self) -> Vec<Registration> {
        self.snapshot.read().await.my_registrations.clone()
    }

    /// The viewer's registration for one event, if any
    pub async fn registration_for(&self, event_id: Uuid) -> Option<Registration> {
        self.snapshot
            .read()
            .await
            .my_registrations
            .iter()
            .find(|r| r.event_id == event_id)
            .cloned()
    }

    pub async fn pending_reviews(&self) -> Vec<Review> {
        self.snapshot.read().await.pending_reviews.clone()
    }

    /// Read-through: approved reviews are not cached
    pub async fn event_reviews(&self, event_id: Uuid) -> AppResult<Vec<Review>> {
        let result = self.services.reviews().event_reviews(event_id).await;
        tracked(&self.error_log, result)
    }

    #[tracing::instrument(skip(self))]
    pub async fn register(&self, event_id: Uuid) -> AppResult<Registration> {
        let user_id = self.require_user().await?;

        let result = self
            .services
            .registrations()
            .register(event_id, user_id)
            .await;
        let registration = tracked(&self.error_log, result)?;
        self.refetch().await;
        Ok(registration)
    }

    #[tracing::instrument(skip(self))]
    pub async fn unregister(&self, event_id: Uuid) -> AppResult<Option<Registration>> {
        let user_id = self.require_user().await?;

        let result = self
            .services
            .registrations()
            .unregister(event_id, user_id)
            .await;
        let removed = tracked(&self.error_log, result)?;
        self.refetch().await;
        Ok(removed)
    }

    #[tracing::instrument(skip(self, comment))]
    pub async fn submit_review(
        &self,
        event_id: Uuid,
        rating: i64,
        comment: &str,
    ) -> AppResult<Review> {
        let user_id = self.require_user().await?;

        let result = self
            .services
            .reviews()
            .create_review(event_id, user_id, rating, comment.to_string())
            .await;
        let review = tracked(&self.error_log, result)?;
        self.refetch().await;
        Ok(review)
    }

    pub async fn approve_review(&self, review_id: Uuid) -> AppResult<Review> {
        self.require_admin().await?;

        let result = self.services.reviews().approve_review(review_id).await;
        let review = tracked(&self.error_log, result)?;
        self.refetch().await;
        Ok(review)
    }

    pub async fn delete_review(&self, review_id: Uuid) -> AppResult<()> {
        self.require_admin().await?;

        let result = self.services.reviews().delete_review(review_id).await;
        tracked(&self.error_log, result)?;
        self.refetch().await;
        Ok(())
    }

    pub async fn create_event(&self, input: NewEvent) -> AppResult<Event> {
        self.require_admin().await?;

        let result = self.services.events().create_event(input).await;
        let event = tracked(&self.error_log, result)?;
        self.refetch().await;
        Ok(event)
    }

    pub async fn update_event(&self, id: Uuid, update: EventUpdate) -> AppResult<Event> {
        self.require_admin().await?;

        let result = self.services.events().update_event(id, update).await;
        let event = tracked(&self.error_log, result)?;
        self.refetch().await;
        Ok(event)
    }

    pub async fn delete_event(&self, id: Uuid) -> AppResult<()> {
        self.require_admin().await?;

        let result = self.services.events().delete_event(id).await;
        tracked(&self.error_log, result)?;
        self.refetch().await;
        Ok(())
    }

    /// Admin attendee list
    pub async fn attendees(&self, event_id: Uuid) -> AppResult<Vec<Registration>> {
        self.require_admin().await?;

        let result = self.services.registrations().list_for_event(event_id).await;
        tracked(&self.error_log, result)
    }

    async fn require_user(&self) -> AppResult<Uuid> {
        self.session.user_id().await.ok_or(AppError::Unauthorized)
    }

    async fn require_admin(&self) -> AppResult<()> {
        self.require_user().await?;
        if !self.session.is_admin().await {
            return Err(DomainError::PermissionDenied.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{DEMO_ADMIN_EMAIL, DEMO_GUEST_EMAIL, DEMO_MEMBER_EMAIL, DEMO_PASSWORD};
    use crate::services::{EventService, Services};
    use crate::state::testing::{demo_services, error_log};
    use async_trait::async_trait;
    use domain::RegistrationStatus;
    use std::sync::atomic::{AtomicBool, Ordering};

    async fn signed_in(services: &Arc<Services>, email: &str) -> CatalogState {
        let log = error_log();
        let session = Arc::new(SessionState::new(services.clone(), log.clone()));
        session.sign_in(email, DEMO_PASSWORD).await.unwrap();

        let catalog = CatalogState::new(services.clone(), session, log);
        catalog.refresh().await.unwrap();
        catalog
    }

    async fn event_named(catalog: &CatalogState, title: &str) -> EventView {
        catalog
            .events()
            .await
            .into_iter()
            .find(|view| view.event.title == title)
            .unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_catalog_lists_events_in_date_order() {
        let services = demo_services();
        let session = Arc::new(SessionState::new(services.clone(), error_log()));
        let catalog = CatalogState::new(services, session, error_log());
        catalog.refresh().await.unwrap();

        let events = catalog.events().await;
        assert_eq!(events.len(), 4);
        assert!(events.windows(2).all(|w| w[0].event.date <= w[1].event.date));
        assert_eq!(events[0].event.title, "Winter Truffle Dinner");
        assert!(catalog.my_registrations().await.is_empty());
    }

    #[tokio::test]
    async fn test_register_refetches_counters() {
        let services = demo_services();
        let catalog = signed_in(&services, DEMO_MEMBER_EMAIL).await;
        let tuscan = event_named(&catalog, "Tuscan Harvest Supper").await;
        assert_eq!(tuscan.member_price, 120.0);

        let registration = catalog.register(tuscan.event.id).await.unwrap();
        assert_eq!(registration.status, RegistrationStatus::Confirmed);

        let refreshed = catalog.event(tuscan.event.id).await.unwrap();
        assert_eq!(refreshed.event.registered_count, 19);
        assert!(catalog.registration_for(tuscan.event.id).await.is_some());

        let removed = catalog.unregister(tuscan.event.id).await.unwrap();
        assert!(removed.is_some());
        let refreshed = catalog.event(tuscan.event.id).await.unwrap();
        assert_eq!(refreshed.event.registered_count, 18);
        assert!(catalog.registration_for(tuscan.event.id).await.is_none());
    }

    #[tokio::test]
    async fn test_guest_registration_is_refused_without_writes() {
        let services = demo_services();
        let catalog = signed_in(&services, DEMO_GUEST_EMAIL).await;
        let street = event_named(&catalog, "Street Food Sunday").await;

        let result = catalog.register(street.event.id).await;
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::SubscriptionRequired))
        ));

        catalog.refresh().await.unwrap();
        let after = catalog.event(street.event.id).await.unwrap();
        assert_eq!(after.event.registered_count, street.event.registered_count);
        assert_eq!(after.event.waitlist_count, street.event.waitlist_count);
    }

    #[tokio::test]
    async fn test_admin_moderation_updates_rating() {
        let services = demo_services();
        let admin = signed_in(&services, DEMO_ADMIN_EMAIL).await;
        let truffle = event_named(&admin, "Winter Truffle Dinner").await;
        assert_eq!(truffle.rating.count, 1);

        let pending = admin.pending_reviews().await;
        assert_eq!(pending.len(), 1);

        admin.approve_review(pending[0].id).await.unwrap();
        assert!(admin.pending_reviews().await.is_empty());

        let rated = admin.event(truffle.event.id).await.unwrap();
        assert_eq!(rated.rating.count, 2);
        assert_eq!(rated.rating.average, 4.5);
        assert_eq!(rated.event, truffle.event);
    }

    #[tokio::test]
    async fn test_submitted_review_waits_for_approval() {
        let services = demo_services();
        let member = signed_in(&services, DEMO_MEMBER_EMAIL).await;
        let truffle = event_named(&member, "Winter Truffle Dinner").await;

        let review = member
            .submit_review(truffle.event.id, 2, "Truffle was shy tonight")
            .await
            .unwrap();
        assert_eq!(review.status, domain::ReviewStatus::Pending);
        assert_eq!(review.user_name, "Marco Member");

        let visible = member.event_reviews(truffle.event.id).await.unwrap();
        assert!(visible.iter().all(|r| r.id != review.id));
        assert_eq!(
            member.event(truffle.event.id).await.unwrap().rating,
            truffle.rating
        );

        let admin = signed_in(&services, DEMO_ADMIN_EMAIL).await;
        assert_eq!(admin.pending_reviews().await.len(), 2);

        let rejected = member.submit_review(truffle.event.id, 0, "").await;
        assert!(matches!(
            rejected,
            Err(AppError::Domain(DomainError::InvalidRating { .. }))
        ));
    }

    #[tokio::test]
    async fn test_members_cannot_moderate() {
        let services = demo_services();
        let member = signed_in(&services, DEMO_MEMBER_EMAIL).await;
        assert!(member.pending_reviews().await.is_empty());

        let result = member.delete_review(Uuid::new_v4()).await;
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::PermissionDenied))
        ));
    }

    /// Event listing that can be switched off to simulate a backend outage
    struct FlakyEvents {
        inner: Arc<dyn EventService>,
        down: AtomicBool,
    }

    #[async_trait]
    impl EventService for FlakyEvents {
        async fn list_events(&self, viewer: Option<&domain::User>) -> AppResult<Vec<EventView>> {
            if self.down.load(Ordering::SeqCst) {
                return Err(AppError::internal("catalog query timed out"));
            }
            self.inner.list_events(viewer).await
        }

        async fn get_event(&self, id: Uuid, viewer: Option<&domain::User>) -> AppResult<EventView> {
            self.inner.get_event(id, viewer).await
        }

        async fn create_event(&self, input: NewEvent) -> AppResult<Event> {
            self.inner.create_event(input).await
        }

        async fn update_event(&self, id: Uuid, update: EventUpdate) -> AppResult<Event> {
            self.inner.update_event(id, update).await
        }

        async fn delete_event(&self, id: Uuid) -> AppResult<()> {
            self.inner.delete_event(id).await
        }
    }

    #[tokio::test]
    async fn test_committed_registration_survives_failed_refetch() {
        let demo = demo_services();
        let events = Arc::new(FlakyEvents {
            inner: demo.events(),
            down: AtomicBool::new(false),
        });
        let services = Arc::new(Services::new(
            demo.auth(),
            demo.users(),
            demo.subscriptions(),
            events.clone(),
            demo.registrations(),
            demo.reviews(),
        ));
        let log = error_log();
        let session = Arc::new(SessionState::new(services.clone(), log.clone()));
        let member = session.sign_in(DEMO_MEMBER_EMAIL, DEMO_PASSWORD).await.unwrap();
        let catalog = CatalogState::new(services.clone(), session, log.clone());
        catalog.refresh().await.unwrap();
        let tuscan = event_named(&catalog, "Tuscan Harvest Supper").await;

        events.down.store(true, Ordering::SeqCst);
        let registration = catalog.register(tuscan.event.id).await.unwrap();
        assert_eq!(registration.status, RegistrationStatus::Confirmed);

        // The seat is taken even though the snapshot could not be refetched
        let stored = services.registrations().list_for_user(member.id).await.unwrap();
        assert!(stored.iter().any(|r| r.event_id == tuscan.event.id));
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].code, "INTERNAL_ERROR");
    }
}
