//! Event catalog repository.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

use super::entities::event::{self, ActiveModel, Entity as EventEntity};
use crate::errors::{AppError, AppResult};
use domain::{DomainError, Event};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Event repository trait for dependency injection.
///
/// Seat counters are written only by the registration repository.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// All events, soonest first
    async fn list(&self) -> AppResult<Vec<Event>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>>;

    async fn create(&self, event: Event) -> AppResult<Event>;

    /// Write the admin-editable fields of `event`.
    ///
    /// Fails with [`DomainError::CapacityBelowRegistered`] if admissions
    /// since the caller's read pushed `registered_count` above the new
    /// capacity.
    async fn update(&self, event: Event) -> AppResult<Event>;

    /// Delete the event with its registrations and reviews.
    /// Returns false if it did not exist.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

/// PostgreSQL implementation of EventRepository
pub struct EventStore {
    db: DatabaseConnection,
}

impl EventStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventRepository for EventStore {
    async fn list(&self) -> AppResult<Vec<Event>> {
        let models = EventEntity::find()
            .order_by_asc(event::Column::Date)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Event::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>> {
        let result = EventEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Event::from))
    }

    async fn create(&self, event: Event) -> AppResult<Event> {
        let model = ActiveModel::new_event(&event)
            .insert(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(Event::from(model))
    }

    async fn update(&self, event: Event) -> AppResult<Event> {
        let capacity = i32::try_from(event.capacity).unwrap_or(i32::MAX);

        // Conditional on the live counter so a concurrent admission cannot
        // be evicted by a capacity cut.
        let result = EventEntity::update_many()
            .set(ActiveModel::editable(&event))
            .filter(event::Column::Id.eq(event.id))
            .filter(Expr::col(event::Column::RegisteredCount).lte(capacity))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            let current = self.find_by_id(event.id).await?.ok_or(DomainError::EventNotFound)?;
            return Err(DomainError::CapacityBelowRegistered {
                capacity: event.capacity,
                registered: current.registered_count,
            }
            .into());
        }

        self.find_by_id(event.id)
            .await?
            .ok_or_else(|| DomainError::EventNotFound.into())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        // Registrations and reviews go with it (ON DELETE CASCADE)
        let result = EventEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected > 0)
    }
}
