//! Library interface for switchyard-cli
//!
//! Exposes argument parsing and command handlers for testing.

/// Argument parsing.
pub mod cli;
/// Command handlers.
pub mod handlers;

pub use cli::{Cli, Commands};
