//! Utility functions shared by the server adapters.
//!
//! This module provides:
//! - Error retriability determination
//! - Retry of idempotent remote calls with exponential backoff

mod retry;

pub(crate) use retry::retry_idempotent;
