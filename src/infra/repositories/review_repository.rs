//! Review repository and rating aggregation queries.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use super::entities::review::{self, ActiveModel, Entity as ReviewEntity};
use crate::errors::{AppError, AppResult};
use domain::{RatingSummary, Review, ReviewStatus};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Review repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create(&self, review: Review) -> AppResult<Review>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Review>>;

    /// Mark approved. `None` if the review does not exist.
    async fn approve(&self, id: Uuid) -> AppResult<Option<Review>>;

    /// Hard delete in any state. Returns false if it did not exist.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Approved reviews of one event, newest first
    async fn list_approved_for_event(&self, event_id: Uuid) -> AppResult<Vec<Review>>;

    /// Pending reviews across all events, newest first
    async fn list_pending(&self) -> AppResult<Vec<Review>>;

    /// Aggregate of the event's approved ratings
    async fn rating_summary(&self, event_id: Uuid) -> AppResult<RatingSummary>;

    /// Aggregates of every event with at least one approved review
    async fn rating_summaries(&self) -> AppResult<HashMap<Uuid, RatingSummary>>;
}

/// PostgreSQL implementation of ReviewRepository
pub struct ReviewStore {
    db: DatabaseConnection,
}

impl ReviewStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromQueryResult)]
struct SummaryRow {
    event_id: Uuid,
    average: Option<f64>,
    count: i64,
}

impl From<&SummaryRow> for RatingSummary {
    fn from(row: &SummaryRow) -> Self {
        RatingSummary::new(
            row.average.unwrap_or_default(),
            u64::try_from(row.count).unwrap_or_default(),
        )
    }
}

/// AVG/COUNT over approved rows, grouped per event
fn approved_summary_query() -> Select<ReviewEntity> {
    ReviewEntity::find()
        .select_only()
        .column(review::Column::EventId)
        .column_as(Expr::cust("AVG(rating)::float8"), "average")
        .column_as(Expr::cust("COUNT(*)"), "count")
        .filter(review::Column::Status.eq(ReviewStatus::Approved.as_str()))
        .group_by(review::Column::EventId)
}

fn into_reviews(models: Vec<review::Model>) -> AppResult<Vec<Review>> {
    models
        .into_iter()
        .map(|m| Review::try_from(m).map_err(AppError::from))
        .collect()
}

#[async_trait]
impl ReviewRepository for ReviewStore {
    async fn create(&self, review: Review) -> AppResult<Review> {
        let model = ActiveModel::from(review)
            .insert(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(Review::try_from(model)?)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Review>> {
        let result = ReviewEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        result.map(|m| Review::try_from(m).map_err(AppError::from)).transpose()
    }

    async fn approve(&self, id: Uuid) -> AppResult<Option<Review>> {
        let Some(model) = ReviewEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut active: review::ActiveModel = model.into();
        active.status = Set(ReviewStatus::Approved.as_str().to_string());
        let model = active.update(&self.db).await.map_err(AppError::from)?;

        Ok(Some(Review::try_from(model)?))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = ReviewEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected > 0)
    }

    async fn list_approved_for_event(&self, event_id: Uuid) -> AppResult<Vec<Review>> {
        let models = ReviewEntity::find()
            .filter(review::Column::EventId.eq(event_id))
            .filter(review::Column::Status.eq(ReviewStatus::Approved.as_str()))
            .order_by_desc(review::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        into_reviews(models)
    }

    async fn list_pending(&self) -> AppResult<Vec<Review>> {
        let models = ReviewEntity::find()
            .filter(review::Column::Status.eq(ReviewStatus::Pending.as_str()))
            .order_by_desc(review::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        into_reviews(models)
    }

    async fn rating_summary(&self, event_id: Uuid) -> AppResult<RatingSummary> {
        let row = approved_summary_query()
            .filter(review::Column::EventId.eq(event_id))
            .into_model::<SummaryRow>()
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(row.as_ref().map(RatingSummary::from).unwrap_or_default())
    }

    async fn rating_summaries(&self) -> AppResult<HashMap<Uuid, RatingSummary>> {
        let rows = approved_summary_query()
            .into_model::<SummaryRow>()
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(rows
            .iter()
            .map(|row| (row.event_id, RatingSummary::from(row)))
            .collect())
    }
}
