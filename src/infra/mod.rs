//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connections and repositories
//! - Session store (Redis)
//! - File storage and outbound mail
//! - Unit of Work giving services one handle onto the backend

pub mod cache;
pub mod db;
pub mod error_log;
pub mod mailer;
pub mod memory;
pub mod repositories;
pub mod storage;
pub mod unit_of_work;

pub use cache::{MemorySessionStore, RedisSessionStore, SessionStore};
pub use db::{Database, Migrator};
pub use error_log::{install_panic_hook, ErrorEntry, ErrorLog};
pub use mailer::{Email, LogMailer, Mailer};
pub use memory::{
    MemoryBackend, DEMO_ADMIN_EMAIL, DEMO_GUEST_EMAIL, DEMO_MEMBER_EMAIL, DEMO_PASSWORD,
};
pub use repositories::{
    Credential, CredentialRepository, EventRepository, PasswordReset, RegistrationRepository,
    ReviewRepository, UserRepository,
};
pub use storage::{FileStorage, LocalFileStorage};
pub use unit_of_work::{Backend, Persistence};

#[cfg(any(test, feature = "test-utils"))]
pub use cache::MockSessionStore;
#[cfg(any(test, feature = "test-utils"))]
pub use mailer::MockMailer;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockCredentialRepository, MockEventRepository, MockRegistrationRepository,
    MockReviewRepository, MockUserRepository,
};
