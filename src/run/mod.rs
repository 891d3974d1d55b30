//! Curation run entry points.
//!
//! [`run_curation`] connects to the configured server and runs the phases;
//! [`curate`] runs them against any [`UpdateServer`](crate::server::UpdateServer).

mod curate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::audit::{ActionLog, ActionRecord};
use crate::config::Config;
use crate::error_handling::RunStats;
use crate::initialization::init_client;
use crate::server::RemoteServer;

pub use curate::curate;

/// Results of a curation run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Every logged action, in the order it was decided
    pub actions: Vec<ActionRecord>,
    /// Counts per action kind and per failed mutation
    pub stats: RunStats,
    /// Number of actions whose server call failed
    pub failures: usize,
    /// Whether mutations were suppressed
    pub dry_run: bool,
    /// Action log the run appended to
    pub log_file: PathBuf,
    /// Elapsed time in seconds
    pub elapsed_seconds: f64,
}

impl RunReport {
    /// True if at least one mutation failed and the run continued past it.
    pub fn has_failures(&self) -> bool {
        self.failures > 0
    }

    /// Process exit code for a finished run: 0, or 2 when a mutation failed.
    ///
    /// Fatal errors never produce a report; the binary exits with 1 for those.
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            2
        } else {
            0
        }
    }

    pub(crate) fn end_marker(&self) -> String {
        format!(
            "run finished: {} actions, {} changes{}, {} failed, {:.1}s",
            self.stats.total_actions(),
            self.stats.total_changes(),
            if self.dry_run { " (dry run)" } else { "" },
            self.failures,
            self.elapsed_seconds
        )
    }
}

/// Runs a curation against the server named in `config`.
///
/// This is the main entry point for the library. It validates the
/// configuration, connects (a failure here aborts before any mutation),
/// opens the action log and runs every phase.
///
/// # Errors
///
/// This function will return an error if:
/// - The configuration is invalid
/// - The HTTP client cannot be built or the server cannot be reached
/// - The action log cannot be opened
/// - Any fatal error occurs during the run (see [`curate`])
///
/// # Example
///
/// ```no_run
/// use wsus_curator::{run_curation, Config};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config {
///     server: "wsus01.corp.example".into(),
///     dry_run: true,
///     ..Default::default()
/// };
/// let report = run_curation(config, CancellationToken::new()).await?;
/// println!("{} actions, {} failed", report.actions.len(), report.failures);
/// # Ok(())
/// # }
/// ```
pub async fn run_curation(config: Config, cancel: CancellationToken) -> Result<RunReport> {
    config.validate().context("Invalid configuration")?;

    let client = init_client(&config).context("Failed to initialize HTTP client")?;
    let base = RemoteServer::base_url(&config).context("Invalid server address")?;
    let server = RemoteServer::new(client, base, config.api_token.clone());

    let info = server
        .connect()
        .await
        .with_context(|| format!("Failed to connect to {}", server.base()))?;
    info!(
        "Connected to {} {} at {}",
        info.name,
        info.version,
        server.base()
    );

    let mut log = ActionLog::open(&config.log_file, config.audit_jsonl.as_deref(), config.dry_run)
        .with_context(|| format!("Failed to open action log {}", config.log_file.display()))?;

    curate(&server, &config, &mut log, &cancel).await
}
