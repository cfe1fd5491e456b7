//! Review service - Submission and moderation.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::infra::Backend;
use domain::{DomainError, Rating, RatingSummary, Review};

/// Review service trait for dependency injection.
#[async_trait]
pub trait ReviewService: Send + Sync {
    /// Submit a review. It stays pending until approved.
    async fn create_review(
        &self,
        event_id: Uuid,
        author_id: Uuid,
        rating: i64,
        comment: String,
    ) -> AppResult<Review>;

    /// Idempotent
    async fn approve_review(&self, id: Uuid) -> AppResult<Review>;

    /// Rejecting a review deletes it, pending or approved
    async fn delete_review(&self, id: Uuid) -> AppResult<()>;

    /// Approved reviews, newest first
    async fn event_reviews(&self, event_id: Uuid) -> AppResult<Vec<Review>>;

    /// Moderation queue across all events, newest first
    async fn pending_reviews(&self) -> AppResult<Vec<Review>>;

    async fn rating_summary(&self, event_id: Uuid) -> AppResult<RatingSummary>;
}

/// Concrete implementation of ReviewService.
pub struct ReviewManager<B: Backend> {
    backend: Arc<B>,
}

impl<B: Backend> ReviewManager<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: Backend> ReviewService for ReviewManager<B> {
    #[tracing::instrument(skip(self, comment))]
    async fn create_review(
        &self,
        event_id: Uuid,
        author_id: Uuid,
        rating: i64,
        comment: String,
    ) -> AppResult<Review> {
        let rating = Rating::new(rating)?;

        let author = self
            .backend
            .users()
            .find_by_id(author_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        if self.backend.events().find_by_id(event_id).await?.is_none() {
            return Err(DomainError::EventNotFound.into());
        }

        let review = Review::submit(event_id, &author, rating, comment, Utc::now())?;
        let review = self.backend.reviews().create(review).await?;

        tracing::info!(review_id = %review.id, "Review submitted for moderation");
        Ok(review)
    }

    #[tracing::instrument(skip(self))]
    async fn approve_review(&self, id: Uuid) -> AppResult<Review> {
        let review = self
            .backend
            .reviews()
            .approve(id)
            .await?
            .ok_or(DomainError::ReviewNotFound)?;

        tracing::info!(event_id = %review.event_id, "Review approved");
        Ok(review)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_review(&self, id: Uuid) -> AppResult<()> {
        if !self.backend.reviews().delete(id).await? {
            return Err(DomainError::ReviewNotFound.into());
        }
        tracing::info!("Review deleted");
        Ok(())
    }

    async fn event_reviews(&self, event_id: Uuid) -> AppResult<Vec<Review>> {
        self.backend.reviews().list_approved_for_event(event_id).await
    }

    async fn pending_reviews(&self) -> AppResult<Vec<Review>> {
        self.backend.reviews().list_pending().await
    }

    async fn rating_summary(&self, event_id: Uuid) -> AppResult<RatingSummary> {
        self.backend.reviews().rating_summary(event_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::services::testing::{guest, upcoming_event, TestBackend};
    use domain::ReviewStatus;

    #[tokio::test]
    async fn test_new_review_is_pending_with_author_snapshot() {
        let mut author = guest("Ada");
        author.photo_url = Some("http://localhost/ada.png".to_string());
        let event = upcoming_event(10, 0, 90.0);
        let event_id = event.id;

        let mut backend = TestBackend::default();
        let stored = author.clone();
        backend
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        backend
            .events
            .expect_find_by_id()
            .returning(move |_| Ok(Some(event.clone())));
        backend.reviews.expect_create().times(1).returning(Ok);

        let review = ReviewManager::new(backend.build())
            .create_review(event_id, author.id, 4, " Lovely evening ".to_string())
            .await
            .unwrap();

        assert_eq!(review.status, ReviewStatus::Pending);
        assert_eq!(review.user_name, "Ada");
        assert_eq!(review.user_photo, author.photo_url);
        assert_eq!(review.comment, "Lovely evening");
    }

    #[tokio::test]
    async fn test_out_of_range_rating_writes_nothing() {
        let mut backend = TestBackend::default();
        backend.reviews.expect_create().never();

        let result = ReviewManager::new(backend.build())
            .create_review(Uuid::new_v4(), Uuid::new_v4(), 6, "Too good".to_string())
            .await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::InvalidRating { value: 6, .. }))
        ));
    }

    #[tokio::test]
    async fn test_review_for_missing_event() {
        let author = guest("Ada");
        let mut backend = TestBackend::default();
        let stored = author.clone();
        backend
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        backend.events.expect_find_by_id().returning(|_| Ok(None));
        backend.reviews.expect_create().never();

        let result = ReviewManager::new(backend.build())
            .create_review(Uuid::new_v4(), author.id, 3, String::new())
            .await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::EventNotFound))
        ));
    }

    #[tokio::test]
    async fn test_moderating_missing_review() {
        let mut backend = TestBackend::default();
        backend.reviews.expect_approve().returning(|_| Ok(None));
        backend.reviews.expect_delete().returning(|_| Ok(false));
        let service = ReviewManager::new(backend.build());

        assert!(matches!(
            service.approve_review(Uuid::new_v4()).await,
            Err(AppError::Domain(DomainError::ReviewNotFound))
        ));
        assert!(matches!(
            service.delete_review(Uuid::new_v4()).await,
            Err(AppError::Domain(DomainError::ReviewNotFound))
        ));
    }
}
