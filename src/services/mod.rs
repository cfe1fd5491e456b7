//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion, and reach every repository through one
//! [`crate::infra::Backend`].

mod auth_service;
pub mod container;
mod event_service;
mod registration_service;
mod review_service;
mod subscription_service;
mod user_service;

#[cfg(test)]
pub(crate) mod testing;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{AuthService, Authenticator, Claims, Session, TokenResponse};
pub use event_service::{EventManager, EventService, EventView};
pub use registration_service::{RegistrationManager, RegistrationService};
pub use review_service::{ReviewManager, ReviewService};
pub use subscription_service::{SubscriptionManager, SubscriptionService, SubscriptionStatusView};
pub use user_service::{UserManager, UserService};

// Parallel execution utilities
pub use container::parallel;

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
