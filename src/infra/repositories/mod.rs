//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence,
//! following the Repository pattern for clean separation of concerns.
//! Each trait has a PostgreSQL store here and an in-memory counterpart in
//! [`crate::infra::memory`].

mod credential_repository;
pub(crate) mod entities;
mod event_repository;
mod registration_repository;
mod review_repository;
mod user_repository;

pub use credential_repository::{
    Credential, CredentialRepository, CredentialStore, PasswordReset,
};
pub use event_repository::{EventRepository, EventStore};
pub use registration_repository::{RegistrationRepository, RegistrationStore};
pub use review_repository::{ReviewRepository, ReviewStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use credential_repository::MockCredentialRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use event_repository::MockEventRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use registration_repository::MockRegistrationRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use review_repository::MockReviewRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
