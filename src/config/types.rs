//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and the immutable policy derived from them.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::constants::{
    APPROVE_CLASSIFICATIONS, DEFAULT_ALLOWED_LOCALES, DEFAULT_LOG_FILE, DEFAULT_PORT,
    DEFAULT_TARGET_GROUP, DEFAULT_TLS_PORT, KNOWN_LOCALES, REQUEST_TIMEOUT_SECS, SYNC_MAX_WAIT_MINUTES,
    SYNC_POLL_INTERVAL_SECS, UPGRADES_CLASSIFICATION,
};
use crate::error_handling::ConfigError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line options for one curation run.
///
/// Parsed once at startup, checked by [`Config::validate`], and never
/// modified afterwards. The decision pipeline only sees the [`PolicyConfig`]
/// derived from it.
///
/// # Examples
///
/// ```bash
/// # Preview what would happen, without touching the server
/// wsus_curator --server wsus01 --dry-run
///
/// # TLS, keep German as well as English, also approve feature upgrades
/// wsus_curator --server wsus01 --use-tls --restrict-to-languages en-us,en-gb,de-de --include-upgrades
///
/// # Decline only, leave approvals to a human
/// wsus_curator --server wsus01 --decline-only --no-sync
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "wsus_curator",
    about = "Deletes, declines and approves WSUS updates according to a fixed policy."
)]
pub struct Config {
    /// WSUS server host name or address
    #[arg(long, env = "WSUS_SERVER", default_value = "localhost")]
    pub server: String,

    /// WSUS port (defaults to 8530, or 8531 with --use-tls)
    #[arg(long, env = "WSUS_PORT")]
    pub port: Option<u16>,

    /// Connect over HTTPS
    #[arg(long, env = "WSUS_USE_TLS")]
    pub use_tls: bool,

    /// Bearer token for the administration API
    #[arg(long, env = "WSUS_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Do not start a synchronization (still waits for a running one)
    #[arg(long)]
    pub no_sync: bool,

    /// Reconsider updates that are already declined
    #[arg(long)]
    pub reset: bool,

    /// Log every decision but issue no mutating call
    #[arg(long)]
    pub dry_run: bool,

    /// Never approve, only delete and decline
    #[arg(long)]
    pub decline_only: bool,

    /// Approve updates classified as Upgrades too
    #[arg(long)]
    pub include_upgrades: bool,

    /// Decline Itanium updates
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub decline_ia64: bool,

    /// Decline ARM64 updates
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub decline_arm64: bool,

    /// Decline 32-bit x86 updates
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub decline_x86: bool,

    /// Decline x64 updates
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    pub decline_x64: bool,

    /// Decline updates whose title mentions "preview"
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub decline_preview: bool,

    /// Decline beta updates
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub decline_beta: bool,

    /// Comma-separated locales to keep; pass an empty string to disable language filtering
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = DEFAULT_ALLOWED_LOCALES.iter().map(|tag| tag.to_string())
    )]
    pub restrict_to_languages: Vec<String>,

    /// Computer group approvals are issued for
    #[arg(long, default_value = DEFAULT_TARGET_GROUP)]
    pub target_group: String,

    /// Seconds between sync-status polls
    #[arg(long, default_value_t = SYNC_POLL_INTERVAL_SECS)]
    pub sync_poll_seconds: u64,

    /// Give up waiting for synchronization after this many minutes
    #[arg(long, default_value_t = SYNC_MAX_WAIT_MINUTES)]
    pub sync_timeout_minutes: u64,

    /// Per-request timeout for the administration API
    #[arg(long, default_value_t = REQUEST_TIMEOUT_SECS)]
    pub request_timeout_seconds: u64,

    /// Append-only action log
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Also append one JSON object per action to this file
    #[arg(long)]
    pub audit_jsonl: Option<PathBuf>,

    /// Abort on the first failed delete/decline/approve instead of continuing
    #[arg(long)]
    pub stop_on_error: bool,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: None,
            use_tls: false,
            api_token: None,
            no_sync: false,
            reset: false,
            dry_run: false,
            decline_only: false,
            include_upgrades: false,
            decline_ia64: true,
            decline_arm64: true,
            decline_x86: true,
            decline_x64: false,
            decline_preview: true,
            decline_beta: true,
            restrict_to_languages: DEFAULT_ALLOWED_LOCALES
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
            target_group: DEFAULT_TARGET_GROUP.to_string(),
            sync_poll_seconds: SYNC_POLL_INTERVAL_SECS,
            sync_timeout_minutes: SYNC_MAX_WAIT_MINUTES,
            request_timeout_seconds: REQUEST_TIMEOUT_SECS,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            audit_jsonl: None,
            stop_on_error: false,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// Port to connect to, falling back to the WSUS default for the transport.
    pub fn effective_port(&self) -> u16 {
        match self.port {
            Some(port) => port,
            None if self.use_tls => DEFAULT_TLS_PORT,
            None => DEFAULT_PORT,
        }
    }

    /// Allowed locales, lower-cased and without blanks.
    ///
    /// An empty result disables the language rule.
    pub fn allowed_locales(&self) -> BTreeSet<String> {
        self.restrict_to_languages
            .iter()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// Interval between two sync-status polls.
    pub fn sync_poll_interval(&self) -> Duration {
        Duration::from_secs(self.sync_poll_seconds)
    }

    /// Maximum time spent waiting for the server to become idle.
    pub fn sync_max_wait(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_minutes.saturating_mul(60))
    }

    /// Checks the options once, before anything talks to the server.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first invalid option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.trim().is_empty() {
            return Err(ConfigError::EmptyServer);
        }
        if self.port == Some(0) {
            return Err(ConfigError::InvalidPort);
        }
        if self.sync_poll_seconds == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.sync_poll_seconds > self.sync_timeout_minutes.saturating_mul(60) {
            return Err(ConfigError::PollLongerThanTimeout {
                poll_seconds: self.sync_poll_seconds,
                timeout_minutes: self.sync_timeout_minutes,
            });
        }
        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::ZeroRequestTimeout);
        }
        if !self.decline_only && self.target_group.trim().is_empty() {
            return Err(ConfigError::EmptyTargetGroup);
        }
        for locale in self.allowed_locales() {
            if !locale
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
            {
                return Err(ConfigError::InvalidLocale(locale));
            }
        }
        Ok(())
    }

    /// Derives the immutable policy consumed by the decision pipeline.
    pub fn policy(&self) -> PolicyConfig {
        let mut approve_classifications: BTreeSet<String> = APPROVE_CLASSIFICATIONS
            .iter()
            .map(|c| c.to_string())
            .collect();
        if self.include_upgrades {
            approve_classifications.insert(UPGRADES_CLASSIFICATION.to_string());
        }

        PolicyConfig {
            decline_ia64: self.decline_ia64,
            decline_arm64: self.decline_arm64,
            decline_x86: self.decline_x86,
            decline_x64: self.decline_x64,
            decline_preview: self.decline_preview,
            decline_beta: self.decline_beta,
            decline_only: self.decline_only,
            approve_classifications,
            known_locales: KNOWN_LOCALES.iter().map(|l| l.to_string()).collect(),
            allowed_locales: self.allowed_locales(),
        }
    }
}

/// The part of the configuration the decision pipeline depends on.
///
/// Built once per run by [`Config::policy`]; the pipeline borrows it
/// immutably for every update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Rule 1
    pub decline_ia64: bool,
    /// Rule 2
    pub decline_arm64: bool,
    /// Rule 3
    pub decline_x86: bool,
    /// Rule 4
    pub decline_x64: bool,
    /// Rule 5
    pub decline_preview: bool,
    /// Rule 6
    pub decline_beta: bool,
    /// Suppresses approvals entirely
    pub decline_only: bool,
    /// Classification titles eligible for approval
    pub approve_classifications: BTreeSet<String>,
    /// Every locale tag the language rule knows about
    pub known_locales: BTreeSet<String>,
    /// Locale tags to keep; empty disables the language rule
    pub allowed_locales: BTreeSet<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Config::default().policy()
    }
}
