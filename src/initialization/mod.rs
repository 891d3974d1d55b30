//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - The console logger
//! - The HTTP client used by `RemoteServer`
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

// Re-export public API
pub use client::{init_client, USER_AGENT};
pub use logger::init_logger_with;
