//! Review entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::{DomainError, Rating, Review, ReviewStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    #[sea_orm(column_type = "Text")]
    pub comment: String,
    pub user_name: String,
    pub user_photo: Option<String>,
    /// `pending` or `approved`
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id",
        on_delete = "Cascade"
    )]
    Event,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Review {
    type Error = DomainError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Review {
            id: model.id,
            event_id: model.event_id,
            user_id: model.user_id,
            rating: Rating::new(i64::from(model.rating))?,
            comment: model.comment,
            user_name: model.user_name,
            user_photo: model.user_photo,
            status: ReviewStatus::from(model.status.as_str()),
            created_at: model.created_at,
        })
    }
}

impl From<Review> for ActiveModel {
    fn from(review: Review) -> Self {
        ActiveModel {
            id: Set(review.id),
            event_id: Set(review.event_id),
            user_id: Set(review.user_id),
            rating: Set(i16::from(review.rating.value())),
            comment: Set(review.comment),
            user_name: Set(review.user_name),
            user_photo: Set(review.user_photo),
            status: Set(review.status.as_str().to_string()),
            created_at: Set(review.created_at),
        }
    }
}
