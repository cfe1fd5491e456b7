//! API middleware.

mod auth;
mod error_log;
mod rate_limit;

pub use auth::{auth_middleware, require_admin, CurrentUser};
pub use error_log::error_log_middleware;
pub use rate_limit::{rate_limit_auth_middleware, rate_limit_middleware};
