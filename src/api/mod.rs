//! HTTP surface over the booking services.
//!
//! Routes are grouped by who may call them: anonymous (health, docs,
//! `/auth`), signed-in members and guests (`/me`, `/events`, `/uploads`)
//! and admins (event writes, `/admin`). Handlers stay thin and delegate to
//! the [`ServiceContainer`](crate::services::ServiceContainer).

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
