//! Domain layer - Core business entities and value objects.
//!
//! Pure rules of the supper club: subscription validity and member pricing,
//! seat admission, review moderation and rating aggregation. No
//! infrastructure dependencies; every time-dependent rule takes `now`.

pub mod constants;
pub mod error;
pub mod event;
pub mod password;
pub mod registration;
pub mod review;
pub mod subscription;
pub mod user;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use event::{Event, EventUpdate, NewEvent};
pub use password::Password;
pub use registration::{Attendance, Registration, RegistrationStatus, Withdrawal};
pub use review::{Rating, RatingSummary, Review, ReviewStatus};
pub use subscription::{
    event_price, has_active_subscription, subscribe, Subscription, SubscriptionOffer,
    SubscriptionPlan, SubscriptionStatus,
};
pub use user::{ProfileUpdate, User, UserRole};
