//! Configuration constants.
//!
//! This module defines the fixed tables of the decline/approve policy and the
//! operational defaults (ports, polling, retry) used throughout the application.

/// Default WSUS port for plain HTTP.
pub const DEFAULT_PORT: u16 = 8530;

/// Conventional WSUS port when the server is configured for SSL.
pub const DEFAULT_TLS_PORT: u16 = 8531;

/// Computer group that approvals target unless `--target-group` says otherwise.
pub const DEFAULT_TARGET_GROUP: &str = "All Computers";

/// Action log written next to the working directory by default.
pub const DEFAULT_LOG_FILE: &str = "./wsus_curator.log";

/// Languages kept by default; every other known locale named in a title is declined.
pub const DEFAULT_ALLOWED_LOCALES: &[&str] = &["en-us", "en-gb"];

// Sync gate
/// Seconds between two sync-status polls
pub const SYNC_POLL_INTERVAL_SECS: u64 = 10;
/// Upper bound on the wait for an in-progress synchronization, in minutes
pub const SYNC_MAX_WAIT_MINUTES: u64 = 120;
/// Polls after starting a sync before an `Idle` status is believed without
/// having seen `Running` (the server picks up a sync request asynchronously)
pub const SYNC_START_GRACE_POLLS: u32 = 3;

// Remote calls
/// Per-request timeout for the administration API.
/// Catalog enumeration on a large server is slow, so this is generous.
pub const REQUEST_TIMEOUT_SECS: u64 = 300;
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 10;

// Retry strategy
/// Initial delay in milliseconds before first retry
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Factor by which retry delay is multiplied on each attempt
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 10;
/// Maximum number of retries for an idempotent remote call
pub const RETRY_MAX_ATTEMPTS: usize = 3;

/// HTTP 429, retried with backoff.
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Classifications approved when an update is not otherwise declined.
///
/// `Upgrades` is appended at runtime when `--include-upgrades` is set.
pub const APPROVE_CLASSIFICATIONS: &[&str] = &[
    "Critical Updates",
    "Definition Updates",
    "Feature Packs",
    "Security Updates",
    "Service Packs",
    "Update Rollups",
    "Updates",
];

/// Classification added to the approve set by `--include-upgrades`.
pub const UPGRADES_CLASSIFICATION: &str = "Upgrades";

/// Language tags WSUS publishes localized updates for.
///
/// A title naming one of these and none of the allowed tags is declined.
/// Matching is substring based, so a product code that happens to look like
/// one of these tags produces a false positive.
pub const KNOWN_LOCALES: &[&str] = &[
    "ar-sa", "bg-bg", "cs-cz", "da-dk", "de-de", "el-gr", "en-gb", "en-us", "es-es", "es-mx",
    "et-ee", "fi-fi", "fr-ca", "fr-fr", "he-il", "hr-hr", "hu-hu", "it-it", "ja-jp", "ko-kr",
    "lt-lt", "lv-lv", "nb-no", "nl-nl", "pl-pl", "pt-br", "pt-pt", "ro-ro", "ru-ru", "sk-sk",
    "sl-si", "sr-latn-rs", "sv-se", "th-th", "tr-tr", "uk-ua", "zh-cn", "zh-hk", "zh-tw",
];
