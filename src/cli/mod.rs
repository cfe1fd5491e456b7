//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `serve` - Start the HTTP server
//! - `migrate` - Database migrations
//! - `demo` - Booking scenarios against demo data

pub mod args;

pub use args::{Cli, Commands};
