//! User profile entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::{NotSet, Set, Unchanged};

use domain::{Subscription, SubscriptionPlan, SubscriptionStatus, User};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub is_admin: bool,
    pub subscription_plan: Option<String>,
    pub subscription_status: Option<String>,
    pub subscription_start: Option<DateTimeUtc>,
    pub subscription_end: Option<DateTimeUtc>,
    pub subscription_price: Option<f64>,
    pub subscription_payment_method: Option<String>,
    pub subscription_auto_renewal: Option<bool>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The embedded subscription, present only when every column is set
    fn subscription(&self) -> Option<Subscription> {
        Some(Subscription {
            plan: SubscriptionPlan::from(self.subscription_plan.as_deref()?),
            status: SubscriptionStatus::from(self.subscription_status.as_deref()?),
            start_date: self.subscription_start?,
            end_date: self.subscription_end?,
            price: self.subscription_price?,
            payment_method: self.subscription_payment_method.clone()?,
            auto_renewal: self.subscription_auto_renewal?,
        })
    }
}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        let subscription = model.subscription();
        User {
            id: model.id,
            email: model.email,
            name: model.name,
            bio: model.bio,
            photo_url: model.photo_url,
            is_admin: model.is_admin,
            subscription,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Full document write at sign-up; every column is set
impl From<User> for ActiveModel {
    fn from(user: User) -> Self {
        let subscription = user.subscription;
        ActiveModel {
            id: Set(user.id),
            email: Set(user.email),
            name: Set(user.name),
            bio: Set(user.bio),
            photo_url: Set(user.photo_url),
            is_admin: Set(user.is_admin),
            subscription_plan: Set(subscription.as_ref().map(|s| s.plan.as_str().to_string())),
            subscription_status: Set(subscription
                .as_ref()
                .map(|s| s.status.as_str().to_string())),
            subscription_start: Set(subscription.as_ref().map(|s| s.start_date)),
            subscription_end: Set(subscription.as_ref().map(|s| s.end_date)),
            subscription_price: Set(subscription.as_ref().map(|s| s.price)),
            subscription_payment_method: Set(subscription
                .as_ref()
                .map(|s| s.payment_method.clone())),
            subscription_auto_renewal: Set(subscription.as_ref().map(|s| s.auto_renewal)),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
    }
}

/// Profile columns only. Subscription and identity columns stay `NotSet`.
pub fn profile_changes(user: &User) -> ActiveModel {
    ActiveModel {
        id: Unchanged(user.id),
        name: Set(user.name.clone()),
        bio: Set(user.bio.clone()),
        photo_url: Set(user.photo_url.clone()),
        updated_at: Set(user.updated_at),
        ..not_set()
    }
}

/// Subscription columns only
pub fn subscription_changes(
    user_id: Uuid,
    subscription: &Subscription,
    updated_at: DateTimeUtc,
) -> ActiveModel {
    ActiveModel {
        id: Unchanged(user_id),
        subscription_plan: Set(Some(subscription.plan.as_str().to_string())),
        subscription_status: Set(Some(subscription.status.as_str().to_string())),
        subscription_start: Set(Some(subscription.start_date)),
        subscription_end: Set(Some(subscription.end_date)),
        subscription_price: Set(Some(subscription.price)),
        subscription_payment_method: Set(Some(subscription.payment_method.clone())),
        subscription_auto_renewal: Set(Some(subscription.auto_renewal)),
        updated_at: Set(updated_at),
        ..not_set()
    }
}

fn not_set() -> ActiveModel {
    ActiveModel {
        id: NotSet,
        email: NotSet,
        name: NotSet,
        bio: NotSet,
        photo_url: NotSet,
        is_admin: NotSet,
        subscription_plan: NotSet,
        subscription_status: NotSet,
        subscription_start: NotSet,
        subscription_end: NotSet,
        subscription_price: NotSet,
        subscription_payment_method: NotSet,
        subscription_auto_renewal: NotSet,
        created_at: NotSet,
        updated_at: NotSet,
    }
}
