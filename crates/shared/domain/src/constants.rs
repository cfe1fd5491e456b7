//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Membership & Pricing
// =============================================================================

/// Flat amount subtracted from an event's base price for active subscribers
pub const FLAT_SUBSCRIBER_DISCOUNT: f64 = 30.0;

/// Price of the annual membership plan
pub const ANNUAL_PLAN_PRICE: f64 = 197.0;

/// Length of the annual plan in calendar months
pub const ANNUAL_PLAN_MONTHS: u32 = 12;

/// Payment method label recorded when the caller supplies none
pub const DEFAULT_PAYMENT_METHOD: &str = "card";

// =============================================================================
// User Roles
// =============================================================================

/// Default role assigned to new users
pub const ROLE_USER: &str = "user";

/// Administrator role with elevated privileges
pub const ROLE_ADMIN: &str = "admin";

// =============================================================================
// Events
// =============================================================================

/// Largest capacity an event may be created with
pub const MAX_EVENT_CAPACITY: u32 = 500;

/// Maximum title length
pub const MAX_EVENT_TITLE_LENGTH: usize = 120;

// =============================================================================
// Reviews
// =============================================================================

/// Lowest star rating a review may carry
pub const MIN_RATING: u8 = 1;

/// Highest star rating a review may carry
pub const MAX_RATING: u8 = 5;

/// Maximum review comment length
pub const MAX_COMMENT_LENGTH: usize = 2000;

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum name length requirement
pub const MIN_NAME_LENGTH: usize = 1;

/// Maximum profile bio length
pub const MAX_BIO_LENGTH: usize = 500;
