//! Event service - Catalog reads with ratings and member pricing, and
//! admin catalog writes.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::container::parallel;
use crate::errors::{AppError, AppResult};
use crate::infra::Backend;
use domain::{event_price, DomainError, Event, EventUpdate, NewEvent, RatingSummary, User};

/// An event as shown to one viewer
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    /// Computed from approved reviews
    pub rating: RatingSummary,
    /// What the viewer pays
    pub member_price: f64,
}

impl EventView {
    pub fn new(event: Event, rating: RatingSummary, viewer: Option<&User>) -> Self {
        let member_price = event_price(event.price, viewer, Utc::now());
        Self {
            event,
            rating,
            member_price,
        }
    }
}

/// Event service trait for dependency injection.
#[async_trait]
pub trait EventService: Send + Sync {
    /// All events, soonest first
    async fn list_events(&self, viewer: Option<&User>) -> AppResult<Vec<EventView>>;

    async fn get_event(&self, id: Uuid, viewer: Option<&User>) -> AppResult<EventView>;

    async fn create_event(&self, input: NewEvent) -> AppResult<Event>;

    async fn update_event(&self, id: Uuid, update: EventUpdate) -> AppResult<Event>;

    /// Removes the event together with its registrations and reviews
    async fn delete_event(&self, id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of EventService.
pub struct EventManager<B: Backend> {
    backend: Arc<B>,
}

impl<B: Backend> EventManager<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    async fn find(&self, id: Uuid) -> AppResult<Event> {
        self.backend
            .events()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::EventNotFound.into())
    }
}

#[async_trait]
impl<B: Backend> EventService for EventManager<B> {
    async fn list_events(&self, viewer: Option<&User>) -> AppResult<Vec<EventView>> {
        let (events, ratings) = parallel::join2(
            self.backend.events().list(),
            self.backend.reviews().rating_summaries(),
        )
        .await?;

        Ok(events
            .into_iter()
            .map(|event| {
                let rating = ratings.get(&event.id).copied().unwrap_or_default();
                EventView::new(event, rating, viewer)
            })
            .collect())
    }

    async fn get_event(&self, id: Uuid, viewer: Option<&User>) -> AppResult<EventView> {
        let (event, rating) =
            parallel::join2(self.find(id), self.backend.reviews().rating_summary(id)).await?;
        Ok(EventView::new(event, rating, viewer))
    }

    #[tracing::instrument(skip(self, input), fields(title = %input.title))]
    async fn create_event(&self, input: NewEvent) -> AppResult<Event> {
        input.validate()?;
        let event = self.backend.events().create(Event::create(input)).await?;

        tracing::info!(event_id = %event.id, "Event created");
        Ok(event)
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_event(&self, id: Uuid, update: EventUpdate) -> AppResult<Event> {
        update.validate()?;

        let mut event = self.find(id).await?;
        update.apply(&mut event)?;
        self.backend.events().update(event).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_event(&self, id: Uuid) -> AppResult<()> {
        if !self.backend.events().delete(id).await? {
            return Err(AppError::from(DomainError::EventNotFound));
        }
        tracing::info!(event_id = %id, "Event deleted");
        Ok(())
    }
}
