//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod identity;
pub mod event;
pub mod registration;
pub mod review;
pub mod user;

pub use identity::{credential, password_reset};
