//! Reviews, moderation status and the computed rating summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MAX_COMMENT_LENGTH, MAX_RATING, MIN_RATING};
use crate::error::{DomainError, DomainResult};
use crate::user::User;

/// Star rating in `MIN_RATING..=MAX_RATING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> DomainResult<Self> {
        if value < i64::from(MIN_RATING) || value > i64::from(MAX_RATING) {
            return Err(DomainError::InvalidRating {
                value,
                min: MIN_RATING,
                max: MAX_RATING,
            });
        }
        Ok(Self(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
        }
    }
}

impl From<&str> for ReviewStatus {
    fn from(s: &str) -> Self {
        match s {
            "approved" => ReviewStatus::Approved,
            _ => ReviewStatus::Pending,
        }
    }
}

/// A review of an event. Rejection is deletion, so there is no rejected state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Review {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub rating: Rating,
    pub comment: String,
    /// Author name at the time of writing
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_photo: Option<String>,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// New reviews always wait for moderation.
    pub fn submit(
        event_id: Uuid,
        author: &User,
        rating: Rating,
        comment: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let comment = comment.into().trim().to_string();
        if comment.chars().count() > MAX_COMMENT_LENGTH {
            return Err(DomainError::validation(format!(
                "Comment must be at most {} characters",
                MAX_COMMENT_LENGTH
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            event_id,
            user_id: author.id,
            rating,
            comment,
            user_name: author.name.clone(),
            user_photo: author.photo_url.clone(),
            status: ReviewStatus::Pending,
            created_at: now,
        })
    }

    pub fn approve(&mut self) {
        self.status = ReviewStatus::Approved;
    }

    pub fn is_approved(&self) -> bool {
        self.status == ReviewStatus::Approved
    }
}

/// Rating aggregate of an event, computed from its approved reviews.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RatingSummary {
    /// Mean of approved ratings, 0 when there are none
    pub average: f64,
    pub count: u64,
}

impl RatingSummary {
    pub fn new(average: f64, count: u64) -> Self {
        if count == 0 {
            return Self::default();
        }
        Self { average, count }
    }

    /// Pending reviews are ignored.
    pub fn from_reviews<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> Self {
        Self::from_ratings(
            reviews
                .into_iter()
                .filter(|r| r.is_approved())
                .map(|r| r.rating),
        )
    }

    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u64, 0u64), |(sum, count), r| {
                (sum + u64::from(r.value()), count + 1)
            });

        if count == 0 {
            return Self::default();
        }
        Self {
            average: sum as f64 / count as f64,
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> User {
        let mut user = User::new(Uuid::new_v4(), "eve@example.com", "Eve");
        user.photo_url = Some("https://cdn.example.com/eve.jpg".to_string());
        user
    }

    fn review(rating: i64, status: ReviewStatus) -> Review {
        let mut review = Review::submit(
            Uuid::new_v4(),
            &author(),
            Rating::new(rating).unwrap(),
            "Lovely",
            Utc::now(),
        )
        .unwrap();
        review.status = status;
        review
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(1).is_ok());
        assert!(Rating::new(5).is_ok());
        assert_eq!(
            Rating::new(0),
            Err(DomainError::InvalidRating {
                value: 0,
                min: 1,
                max: 5
            })
        );
        assert!(Rating::new(6).is_err());
        assert!(Rating::new(-3).is_err());
    }

    #[test]
    fn test_rating_deserialize_rejects_out_of_range() {
        assert_eq!(serde_json::from_str::<Rating>("4").unwrap().value(), 4);
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }

    #[test]
    fn test_submit_is_pending_with_author_snapshot() {
        let user = author();
        let review = Review::submit(
            Uuid::new_v4(),
            &user,
            Rating::new(4).unwrap(),
            "  Wonderful evening ",
            Utc::now(),
        )
        .unwrap();

        assert_eq!(review.status, ReviewStatus::Pending);
        assert_eq!(review.user_name, "Eve");
        assert_eq!(review.user_photo, user.photo_url);
        assert_eq!(review.comment, "Wonderful evening");
    }

    #[test]
    fn test_approve_is_idempotent() {
        let mut review = review(5, ReviewStatus::Pending);
        review.approve();
        let once = review.clone();
        review.approve();

        assert_eq!(review, once);
        assert!(review.is_approved());
    }

    #[test]
    fn test_summary_counts_only_approved() {
        let reviews = vec![
            review(5, ReviewStatus::Approved),
            review(4, ReviewStatus::Approved),
            review(1, ReviewStatus::Pending),
        ];

        let summary = RatingSummary::from_reviews(&reviews);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, 4.5);
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(RatingSummary::from_reviews(&[]), RatingSummary::default());
        assert_eq!(RatingSummary::new(3.0, 0).average, 0.0);
    }
}
