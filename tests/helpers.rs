// Shared test helpers for catalog fixtures and running a curation.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use wsus_curator::audit::{ActionLog, ActionRecord};
use wsus_curator::server::{InMemoryServer, PublicationState, ServerCall, UpdateId, UpdateRecord};
use wsus_curator::{curate, Config, RunReport};

/// An update selected by the default subscription.
#[allow(dead_code)] // Used by other test files
pub fn update(id: &str, title: &str, classification: &str) -> UpdateRecord {
    UpdateRecord {
        id: UpdateId::from(id),
        title: title.to_string(),
        classification_title: classification.to_string(),
        product_titles: vec!["Windows Server 2022".to_string()],
        ..Default::default()
    }
}

/// Subscription, target group and nothing else.
#[allow(dead_code)]
pub fn empty_server() -> InMemoryServer {
    InMemoryServer::new()
        .with_classifications(&[
            "Critical Updates",
            "Drivers",
            "Feature Packs",
            "Security Updates",
            "Updates",
        ])
        .with_categories(&["Windows Server 2022"])
        .with_group("All Computers")
}

/// One update for every outcome of the pipeline, none of them linked by supersession.
///
/// Expected decisions with the default configuration:
/// - `gone`: deleted (not selected)
/// - `keep-sec`: approved
/// - `arm`: declined (arm64)
/// - `fr`: declined (language)
/// - `eula`: license accepted, then approved
/// - `expired`: deferred, declined in the second pass
/// - `sup-arm`: declined (arm64) before its supersession is considered
/// - `drv`: skipped (classification not approved)
/// - `approved`: skipped (already approved)
#[allow(dead_code)]
pub fn mixed_catalog() -> InMemoryServer {
    let gone = UpdateRecord {
        product_titles: vec!["Silverlight".to_string()],
        ..update("gone", "Microsoft Silverlight (KB9)", "Tools")
    };
    let eula = UpdateRecord {
        requires_license_agreement_acceptance: true,
        ..update("eula", "Windows Server 2022 Feature Pack (KB3)", "Feature Packs")
    };
    let expired = UpdateRecord {
        publication_state: PublicationState::Expired,
        ..update("expired", "Update for Windows Server 2022 (KB4)", "Updates")
    };
    let sup_arm = UpdateRecord {
        is_superseded: true,
        ..update(
            "sup-arm",
            "Update for Windows 11 for ARM64-based Systems (KB5)",
            "Updates",
        )
    };
    let approved = UpdateRecord {
        is_approved: true,
        ..update(
            "approved",
            "Security Update for Windows Server 2022 (KB6)",
            "Security Updates",
        )
    };

    empty_server()
        .with_update(gone)
        .with_update(update(
            "keep-sec",
            "Security Update for Windows Server 2022 (KB1)",
            "Security Updates",
        ))
        .with_update(update(
            "arm",
            "Update for Windows 11 for ARM64-based Systems (KB2)",
            "Updates",
        ))
        .with_update(update(
            "fr",
            "Windows Server 2022 Language Pack (fr-fr)",
            "Updates",
        ))
        .with_update(eula)
        .with_update(expired)
        .with_update(sup_arm)
        .with_update(update("drv", "Intel Network Driver", "Drivers"))
        .with_update(approved)
}

/// Default configuration without sync, logging into `dir`.
#[allow(dead_code)]
pub fn config(dir: &TempDir) -> Config {
    Config {
        no_sync: true,
        log_file: dir.path().join("actions.log"),
        ..Default::default()
    }
}

/// Runs every phase against `server` with a fresh action log.
#[allow(dead_code)]
pub async fn run(server: &InMemoryServer, config: &Config) -> anyhow::Result<RunReport> {
    run_with_cancel(server, config, &CancellationToken::new()).await
}

#[allow(dead_code)]
pub async fn run_with_cancel(
    server: &InMemoryServer,
    config: &Config,
    cancel: &CancellationToken,
) -> anyhow::Result<RunReport> {
    let mut log = ActionLog::open(&config.log_file, config.audit_jsonl.as_deref(), config.dry_run)?;
    curate(server, config, &mut log, cancel).await
}

/// Catalog mutations only (sync requests filtered out).
#[allow(dead_code)]
pub fn mutations(server: &InMemoryServer) -> Vec<ServerCall> {
    server
        .calls()
        .into_iter()
        .filter(|c| *c != ServerCall::StartSync)
        .collect()
}

/// `(phase, ACTION, update id)` for each logged action.
#[allow(dead_code)]
pub fn summary(actions: &[ActionRecord]) -> Vec<(&'static str, &'static str, String)> {
    actions
        .iter()
        .map(|a| (a.phase.as_str(), a.kind.as_str(), a.update_id.to_string()))
        .collect()
}
