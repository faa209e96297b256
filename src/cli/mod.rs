//! CLI entry point
//!
//! Runs one export configured via environment variables.

mod config;
mod runner;

pub use runner::{run, EXIT_CONFIG};
