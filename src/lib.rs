//! Supper Club - Culinary event booking backend
//!
//! Members subscribe to an annual plan, book seats at chef-led dinners
//! (joining a waitlist once an event is full) and leave reviews that
//! admins moderate.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **infra**: Backend gateway (PostgreSQL or in-memory), sessions, storage, mail
//! - **services**: Application use cases
//! - **state**: Per-session snapshots that write through and refetch
//! - **api**: HTTP handlers, middleware, and routes
//! - **types**: Shared response types
//! - **errors**: Centralized error handling
//!
//! Business rules live in the `domain` crate.
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//!
//! # Walk through the booking scenarios on demo data
//! cargo run -- demo
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod infra;
pub mod services;
pub mod state;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use errors::{AppError, AppResult};
