//! Durable record of what a run decided and did.
//!
//! This module provides:
//! - Action, phase and outcome types
//! - The append-only action log with its optional JSONL twin

mod action_log;
mod types;

pub use action_log::ActionLog;
pub use types::{ActionKind, ActionRecord, Outcome, Phase};
