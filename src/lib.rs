//! wsus_curator library: policy-driven curation of a WSUS update catalog
//!
//! This library connects to a Windows Server Update Services administration
//! gateway and applies a fixed rule set to its catalog: updates the
//! subscription no longer selects are deleted; unwanted architectures,
//! previews, betas and foreign-language updates are declined; wanted
//! classifications are approved; and whatever the approvals leave superseded
//! or expired is declined in a second pass.
//!
//! # Example
//!
//! ```no_run
//! use wsus_curator::{run_curation, Config};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config {
//!     server: "wsus01.corp.example".into(),
//!     dry_run: true,
//!     ..Default::default()
//! };
//!
//! let report = run_curation(config, CancellationToken::new()).await?;
//! println!("{} actions logged to {}", report.actions.len(), report.log_file.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

mod app;
pub mod audit;
pub mod config;
mod error_handling;
pub mod initialization;
pub mod policy;
mod run;
pub mod server;
pub mod sync_gate;
mod utils;

// Re-export public API
pub use app::{cancel_on_ctrl_c, print_run_summary};
pub use config::{Config, LogFormat, LogLevel, PolicyConfig};
pub use error_handling::{
    ConfigError, InitializationError, MutationError, MutationKind, RunStats, ServerError,
    SyncError,
};
pub use run::{curate, run_curation, RunReport};
