//! Domain-level errors.
//!
//! These errors represent business rule violations and domain logic failures.
//! They are independent of infrastructure concerns (HTTP, database).

use thiserror::Error;

/// Domain-specific errors for business rule violations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Validation failed for a field or input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Password-related errors
    #[error("Password error: {0}")]
    Password(String),

    /// Star rating outside the accepted range
    #[error("Rating must be between {min} and {max}, got {value}")]
    InvalidRating { value: i64, min: u8, max: u8 },

    #[error("Event not found")]
    EventNotFound,

    #[error("Review not found")]
    ReviewNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Already registered for this event")]
    AlreadyRegistered,

    /// The event has already taken place
    #[error("Registration is closed for this event")]
    RegistrationClosed,

    /// Member-only action attempted without an active subscription
    #[error("An active subscription is required")]
    SubscriptionRequired,

    #[error("Already subscribed")]
    AlreadySubscribed,

    /// Capacity edit would evict confirmed attendees
    #[error("Capacity {capacity} is below the {registered} confirmed registrations")]
    CapacityBelowRegistered { capacity: u32, registered: u32 },

    #[error("Permission denied")]
    PermissionDenied,

    /// Internal domain error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    /// Create a password error
    pub fn password(msg: impl Into<String>) -> Self {
        DomainError::Password(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        DomainError::Internal(msg.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
