//! Event entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::{NotSet, Set};

use domain::Event;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub chef_name: String,
    pub image_url: Option<String>,
    #[sea_orm(column_name = "event_date")]
    pub date: DateTimeUtc,
    pub location: String,
    pub capacity: i32,
    pub price: f64,
    pub registered_count: i32,
    pub waitlist_count: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::registration::Entity")]
    Registrations,
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::registration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registrations.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Event {
    fn from(model: Model) -> Self {
        Event {
            id: model.id,
            title: model.title,
            description: model.description,
            chef_name: model.chef_name,
            image_url: model.image_url,
            date: model.date,
            location: model.location,
            capacity: to_count(model.capacity),
            price: model.price,
            registered_count: to_count(model.registered_count),
            waitlist_count: to_count(model.waitlist_count),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl ActiveModel {
    /// Insert model for a freshly created event
    pub fn new_event(event: &Event) -> Self {
        let mut active = Self::editable(event);
        active.id = Set(event.id);
        active.registered_count = Set(to_column(event.registered_count));
        active.waitlist_count = Set(to_column(event.waitlist_count));
        active.created_at = Set(event.created_at);
        active
    }

    /// Admin-editable columns only. Counters stay untouched so an edit never
    /// races with admission.
    pub fn editable(event: &Event) -> Self {
        ActiveModel {
            id: NotSet,
            title: Set(event.title.clone()),
            description: Set(event.description.clone()),
            chef_name: Set(event.chef_name.clone()),
            image_url: Set(event.image_url.clone()),
            date: Set(event.date),
            location: Set(event.location.clone()),
            capacity: Set(to_column(event.capacity)),
            price: Set(event.price),
            registered_count: NotSet,
            waitlist_count: NotSet,
            created_at: NotSet,
            updated_at: Set(event.updated_at),
        }
    }
}

fn to_count(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn to_column(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
