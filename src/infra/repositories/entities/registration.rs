//! Registration entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{Registration, RegistrationStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "registrations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    /// `confirmed` or `waitlist`
    pub status: String,
    pub registered_at: DateTimeUtc,
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

impl From<Model> for Registration {
    fn from(model: Model) -> Self {
        Registration {
            id: model.id,
            event_id: model.event_id,
            user_id: model.user_id,
            status: RegistrationStatus::from(model.status.as_str()),
            registered_at: model.registered_at,
        }
    }
}
