//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `wsus_curator` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Exit codes: 0 success, 1 fatal error, 2 finished with failed mutations
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use wsus_curator::initialization::init_logger_with;
use wsus_curator::{cancel_on_ctrl_c, print_run_summary, run_curation, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // This allows keeping WSUS_API_TOKEN out of the shell history
    // Try loading from current directory first, then from the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    let cancel = cancel_on_ctrl_c();

    match run_curation(config, cancel).await {
        Ok(report) => {
            print_run_summary(&report);
            let code = report.exit_code();
            if code != 0 {
                eprintln!(
                    "wsus_curator: {} update{} could not be changed - see {}",
                    report.failures,
                    if report.failures == 1 { "" } else { "s" },
                    report.log_file.display()
                );
                process::exit(code);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("wsus_curator error: {:#}", e);
            process::exit(1);
        }
    }
}
