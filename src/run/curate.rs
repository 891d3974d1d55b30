//! The two-pass curation run.
//!
//! Phases, in order:
//! 1. Sync gate: wait until the server is not synchronizing
//! 2. Prune: delete updates the subscription no longer selects
//! 3. Decide: run the decision pipeline over the refetched catalog and act
//! 4. Resolve: decline what is superseded or expired after the approvals
//!
//! Every decision is written to the action log before the next update is
//! considered, so a run that aborts leaves an exact record of its progress.

use std::collections::HashSet;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::audit::{ActionLog, ActionRecord, Outcome, Phase};
use crate::config::Config;
use crate::error_handling::{MutationError, MutationKind, RunStats, ServerError};
use crate::policy::{is_selected, Decision, Pipeline};
use crate::server::{
    ApprovalAction, ComputerGroup, Subscription, UpdateId, UpdateRecord, UpdateServer,
};
use crate::sync_gate::SyncGate;

use super::RunReport;

/// Mutable state of one run against one server.
struct Curation<'a, S> {
    server: &'a S,
    config: &'a Config,
    log: &'a mut ActionLog,
    cancel: &'a CancellationToken,
    pipeline: Pipeline,
    group: Option<ComputerGroup>,
    actions: Vec<ActionRecord>,
    stats: RunStats,
    /// Dry run only: updates a real run would have deleted or declined by now
    projected: HashSet<UpdateId>,
}

/// Runs all phases against `server`, writing every decision to `log`.
///
/// Mutation failures are logged and counted, and the run moves on to the
/// next update; with `stop_on_error` the first one aborts the run instead.
///
/// # Errors
///
/// Returns an error (after noting it in the action log) if:
/// - the sync gate times out, is cancelled or cannot read the status
/// - the target group does not exist (unless decline-only)
/// - the subscription or catalog cannot be read
/// - the action log cannot be written
/// - the run is cancelled, or a mutation fails under `stop_on_error`
pub async fn curate<S: UpdateServer>(
    server: &S,
    config: &Config,
    log: &mut ActionLog,
    cancel: &CancellationToken,
) -> Result<RunReport> {
    let started = Instant::now();
    let pipeline =
        Pipeline::new(config.policy()).context("Failed to build the locale matcher")?;

    log.note(Phase::Run, &run_banner(config))
        .context("Failed to write action log")?;

    let mut curation = Curation {
        server,
        config,
        log: &mut *log,
        cancel,
        pipeline,
        group: None,
        actions: Vec::new(),
        stats: RunStats::new(),
        projected: HashSet::new(),
    };

    let outcome = curation.run_phases().await;
    match outcome {
        Ok(()) => {
            let report = curation.into_report(started.elapsed().as_secs_f64());
            log.note(Phase::Run, &report.end_marker())
                .context("Failed to write action log")?;
            Ok(report)
        }
        Err(e) => {
            // The abort itself is part of the record; a log failure here must not mask `e`.
            if let Err(log_err) = curation
                .log
                .note(Phase::Run, &format!("run aborted: {e:#}"))
            {
                warn!("Could not record abort in action log: {log_err}");
            }
            Err(e)
        }
    }
}

fn run_banner(config: &Config) -> String {
    format!(
        "run started: server={}:{} tls={} sync={} reset={} dry_run={} decline_only={} include_upgrades={} locales=[{}]",
        config.server,
        config.effective_port(),
        config.use_tls,
        !config.no_sync,
        config.reset,
        config.dry_run,
        config.decline_only,
        config.include_upgrades,
        config
            .allowed_locales()
            .into_iter()
            .collect::<Vec<_>>()
            .join(",")
    )
}

impl<S: UpdateServer> Curation<'_, S> {
    async fn run_phases(&mut self) -> Result<()> {
        self.sync_gate().await?;

        if !self.config.decline_only {
            let group = self
                .server
                .find_group(&self.config.target_group)
                .await
                .context("Failed to resolve the approval target group")?;
            debug!("Approvals target group {} ({})", group.name, group.id);
            self.group = Some(group);
        }

        self.prune().await?;
        self.decide_and_act().await?;
        self.resolve_deferred().await?;
        Ok(())
    }

    async fn sync_gate(&mut self) -> Result<()> {
        let gate = SyncGate::from_config(self.config);
        let outcome = gate
            .wait_until_idle(self.server, !self.config.no_sync, self.cancel)
            .await
            .context("Synchronization gate failed")?;
        let message = format!(
            "server idle (sync started: {}, waited {}s)",
            outcome.started,
            outcome.waited.as_secs()
        );
        info!("{message}");
        self.log
            .note(Phase::Sync, &message)
            .context("Failed to write action log")?;
        Ok(())
    }

    async fn prune(&mut self) -> Result<()> {
        let subscription = Subscription::fetch(self.server)
            .await
            .context("Failed to read the subscription")?;
        let catalog = self
            .server
            .all_updates()
            .await
            .context("Failed to enumerate the catalog")?;
        info!(
            "Pruning {} updates against {} classifications and {} categories",
            catalog.len(),
            subscription.classifications.len(),
            subscription.categories.len()
        );

        for update in catalog {
            self.check_cancelled()?;
            if is_selected(
                &update,
                &subscription.classifications,
                &subscription.categories,
            ) {
                continue;
            }
            if self.config.dry_run {
                self.projected.insert(update.id.clone());
            }
            self.act(&update, &[MutationKind::Delete], |u, outcome| {
                ActionRecord::new(Phase::Prune, Decision::Delete, u, outcome)
            })
            .await?;
        }
        Ok(())
    }

    async fn decide_and_act(&mut self) -> Result<()> {
        let catalog = if self.config.reset {
            self.server.all_updates().await
        } else {
            self.server.undeclined_updates().await
        }
        .context("Failed to refetch the catalog")?;
        let catalog = self.without_projected(catalog);
        info!("Evaluating {} updates", catalog.len());

        for update in catalog {
            self.check_cancelled()?;
            let decision = self.pipeline.decide(&update);
            let kinds: &[MutationKind] = match decision {
                // Under --reset a declined update can come back with a decline decision.
                d if d.is_decline() && update.is_declined => &[],
                d if d.is_decline() => &[MutationKind::Decline],
                Decision::ApproveWithLicense => {
                    &[MutationKind::AcceptLicense, MutationKind::Approve]
                }
                Decision::Approve => &[MutationKind::Approve],
                _ => &[],
            };
            if self.config.dry_run && decision.is_decline() {
                self.projected.insert(update.id.clone());
            }
            self.act(&update, kinds, |u, outcome| {
                ActionRecord::new(Phase::Decide, decision, u, outcome)
            })
            .await?;
        }
        Ok(())
    }

    async fn resolve_deferred(&mut self) -> Result<()> {
        let catalog = self
            .server
            .undeclined_updates()
            .await
            .context("Failed to refetch the catalog for the second pass")?;
        let stale: Vec<UpdateRecord> = self
            .without_projected(catalog)
            .into_iter()
            .filter(UpdateRecord::is_superseded_or_expired)
            .collect();
        info!("Declining {} superseded or expired updates", stale.len());

        for update in stale {
            self.check_cancelled()?;
            self.act(&update, &[MutationKind::Decline], ActionRecord::resolve)
                .await?;
        }
        Ok(())
    }

    fn without_projected(&self, catalog: Vec<UpdateRecord>) -> Vec<UpdateRecord> {
        if self.projected.is_empty() {
            return catalog;
        }
        catalog
            .into_iter()
            .filter(|u| !self.projected.contains(&u.id))
            .collect()
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            bail!("Run cancelled after {} actions", self.actions.len());
        }
        Ok(())
    }

    /// Issues `kinds` in order (unless dry run), then logs the resulting action.
    async fn act<F>(&mut self, update: &UpdateRecord, kinds: &[MutationKind], make: F) -> Result<()>
    where
        F: FnOnce(&UpdateRecord, Outcome) -> ActionRecord,
    {
        let (outcome, failure) = if kinds.is_empty() {
            (Outcome::NoCall, None)
        } else if self.config.dry_run {
            (Outcome::DryRun, None)
        } else {
            match self.perform(kinds, &update.id).await {
                Ok(()) => (Outcome::Done, None),
                Err(e) => (Outcome::Failed(e.to_string()), Some(e)),
            }
        };

        let action = make(update, outcome);
        self.log
            .record(&action)
            .context("Failed to write action log")?;
        self.stats.record(&action);
        self.actions.push(action);

        match failure {
            Some(e) => {
                warn!("{e}");
                self.stats.record_failure(e.kind);
                if self.config.stop_on_error {
                    return Err(anyhow::Error::new(e)
                        .context("Stopping at the first failed mutation (--stop-on-error)"));
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn perform(&self, kinds: &[MutationKind], id: &UpdateId) -> Result<(), MutationError> {
        for &kind in kinds {
            self.call(kind, id)
                .await
                .map_err(|source| MutationError::new(kind, id.clone(), source))?;
        }
        Ok(())
    }

    async fn call(&self, kind: MutationKind, id: &UpdateId) -> Result<(), ServerError> {
        match kind {
            MutationKind::Delete => self.server.delete_update(id).await,
            MutationKind::Decline => self.server.decline_update(id).await,
            MutationKind::AcceptLicense => self.server.accept_license_agreement(id).await,
            MutationKind::Approve => match &self.group {
                Some(group) => {
                    self.server
                        .approve_update(id, ApprovalAction::Install, group)
                        .await
                }
                None => Err(ServerError::Rejected {
                    operation: "ApproveUpdate",
                    reason: "no target group resolved".to_string(),
                }),
            },
        }
    }

    fn into_report(self, elapsed_seconds: f64) -> RunReport {
        let failures = RunStats::failed_actions(&self.actions);
        RunReport {
            actions: self.actions,
            stats: self.stats,
            failures,
            dry_run: self.config.dry_run,
            log_file: self.config.log_file.clone(),
            elapsed_seconds,
        }
    }
}
