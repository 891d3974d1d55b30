//! Error type definitions.
//!
//! This module defines all error types used throughout the application.

use std::time::Duration;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::server::UpdateId;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error opening the action log or audit file.
    #[error("Action log initialization error: {0}")]
    ActionLogError(#[from] std::io::Error),
}

/// Invalid command-line options, reported before connecting.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// No server given.
    #[error("Server address must not be empty")]
    EmptyServer,

    /// Port 0.
    #[error("Port must be between 1 and 65535")]
    InvalidPort,

    /// `--sync-poll-seconds 0` would spin.
    #[error("Sync poll interval must be at least one second")]
    ZeroPollInterval,

    /// The first poll would already exceed the wait budget.
    #[error("Sync poll interval ({poll_seconds}s) exceeds the sync timeout ({timeout_minutes}min)")]
    PollLongerThanTimeout {
        /// Configured poll interval
        poll_seconds: u64,
        /// Configured wait budget
        timeout_minutes: u64,
    },

    /// `--request-timeout-seconds 0`.
    #[error("Request timeout must be at least one second")]
    ZeroRequestTimeout,

    /// Approvals need a group.
    #[error("Target group must not be empty unless --decline-only is set")]
    EmptyTargetGroup,

    /// A locale tag with characters that cannot appear in a tag.
    #[error("Invalid locale tag: '{0}'")]
    InvalidLocale(String),

    /// Server and port do not form a valid URL.
    #[error("Invalid server address: {0}")]
    InvalidServerUrl(String),
}

/// Failures talking to the WSUS administration API.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The server could not be reached at all.
    #[error("Cannot connect to {endpoint}: {source}")]
    Connection {
        /// Base URL that was tried
        endpoint: String,
        /// Underlying transport error
        #[source]
        source: ReqwestError,
    },

    /// The request was sent but failed in transit (timeout, reset).
    #[error("{operation} request failed: {source}")]
    Request {
        /// Logical call, e.g. `GetAllUpdates`
        operation: &'static str,
        /// Underlying transport error
        #[source]
        source: ReqwestError,
    },

    /// The server answered with a non-success status.
    #[error("{operation} returned HTTP {status}")]
    Status {
        /// Logical call, e.g. `DeclineUpdate`
        operation: &'static str,
        /// HTTP status code
        status: u16,
    },

    /// The response body did not match the expected shape.
    #[error("Could not decode {operation} response: {source}")]
    Decode {
        /// Logical call
        operation: &'static str,
        /// Underlying decode error
        #[source]
        source: ReqwestError,
    },

    /// The update id is unknown to the server.
    #[error("Update {0} not found")]
    UpdateNotFound(UpdateId),

    /// No computer group with that exact name.
    #[error("Computer group '{0}' not found")]
    GroupNotFound(String),

    /// The server refused the operation.
    #[error("{operation} rejected: {reason}")]
    Rejected {
        /// Logical call
        operation: &'static str,
        /// Reason given by the server
        reason: String,
    },
}

/// Failures of the sync gate.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The server never reported idle within the wait budget.
    #[error("Synchronization still running after {waited:?}")]
    Timeout {
        /// Time spent waiting
        waited: Duration,
    },

    /// The wait was cancelled (Ctrl-C).
    #[error("Wait for synchronization was cancelled")]
    Cancelled,

    /// Polling or starting the sync failed.
    #[error("Sync status unavailable: {0}")]
    Server(#[from] ServerError),
}

/// The four catalog mutations the run can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum MutationKind {
    /// `DeleteUpdate`
    Delete,
    /// `DeclineUpdate`
    Decline,
    /// `AcceptLicenseAgreement`
    AcceptLicense,
    /// `ApproveUpdate`
    Approve,
}

impl MutationKind {
    /// Lower-case name for messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Delete => "delete",
            MutationKind::Decline => "decline",
            MutationKind::AcceptLicense => "accept license",
            MutationKind::Approve => "approve",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failed catalog mutation.
///
/// Updates are independent, so the run records this and moves on to the
/// next update unless `--stop-on-error` is set.
#[derive(Error, Debug)]
#[error("{kind} of update {update_id} failed: {source}")]
pub struct MutationError {
    /// Which call failed
    pub kind: MutationKind,
    /// Update the call targeted
    pub update_id: UpdateId,
    /// Why it failed
    #[source]
    pub source: ServerError,
}

impl MutationError {
    /// Wraps the server error of a failed mutation.
    pub fn new(kind: MutationKind, update_id: UpdateId, source: ServerError) -> Self {
        Self {
            kind,
            update_id,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_mutation_kind_strings_unique() {
        let names: std::collections::HashSet<_> = MutationKind::iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), MutationKind::iter().count());
    }

    #[test]
    fn test_mutation_error_message() {
        let err = MutationError::new(
            MutationKind::Decline,
            UpdateId::from("abc"),
            ServerError::Status {
                operation: "DeclineUpdate",
                status: 500,
            },
        );
        assert_eq!(
            err.to_string(),
            "decline of update abc failed: DeclineUpdate returned HTTP 500"
        );
    }

    #[test]
    fn test_sync_timeout_message() {
        let err = SyncError::Timeout {
            waited: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::InvalidLocale("en us".into()).to_string(),
            "Invalid locale tag: 'en us'"
        );
        let err = ConfigError::PollLongerThanTimeout {
            poll_seconds: 600,
            timeout_minutes: 1,
        };
        assert!(err.to_string().contains("600s"));
    }
}
