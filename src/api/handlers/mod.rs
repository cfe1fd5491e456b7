//! HTTP request handlers.

pub mod admin_handler;
pub mod auth_handler;
pub mod event_handler;
pub mod me_handler;
pub mod upload_handler;

pub use admin_handler::admin_routes;
pub use auth_handler::{auth_routes, session_routes};
pub use event_handler::event_routes;
pub use me_handler::me_routes;
pub use upload_handler::upload_routes;
