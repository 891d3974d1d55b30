//! Error handling and run statistics.
//!
//! This module provides:
//! - Error type definitions for configuration, server access, sync and mutations
//! - Run statistics (actions per kind, failures per mutation)
//! - Retry strategy configuration
//!
//! Errors are split by how the run treats them:
//! - **Fatal**: configuration, initialization, enumeration and sync failures abort the run
//! - **Per-update**: a failed mutation is logged and the run moves on

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::get_retry_strategy;
pub use stats::RunStats;
pub use types::{
    ConfigError, InitializationError, MutationError, MutationKind, ServerError, SyncError,
};
