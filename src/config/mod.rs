//! Application configuration and constants.
//!
//! This module provides:
//! - Policy tables and operational constants
//! - CLI option types and parsing
//! - The immutable policy handed to the decision pipeline

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel, PolicyConfig};
