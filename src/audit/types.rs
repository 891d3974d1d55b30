//! Action records written to the action log.

use serde::Serialize;
use strum_macros::EnumIter as EnumIterMacro;

use crate::policy::Decision;
use crate::server::{UpdateId, UpdateRecord};

/// Phase of the run an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Run start and end markers
    Run,
    /// Sync gate
    Sync,
    /// Deletion of deselected updates
    Prune,
    /// Decision pass over the catalog
    Decide,
    /// Second pass over superseded and expired updates
    Resolve,
}

impl Phase {
    /// Name used in the action log.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Run => "run",
            Phase::Sync => "sync",
            Phase::Prune => "prune",
            Phase::Decide => "decide",
            Phase::Resolve => "resolve",
        }
    }
}

/// Kind of logged action, one per decision outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIterMacro)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Physical removal from the catalog
    Delete,
    /// Declined for its architecture
    DeclineArch,
    /// Declined as a preview
    DeclinePreview,
    /// Declined as a beta
    DeclineBeta,
    /// Declined for its language
    DeclineLanguage,
    /// Declined in the second pass as superseded
    DeclineSuperseded,
    /// Declined in the second pass as expired
    DeclineExpired,
    /// Approved for the target group
    Approve,
    /// License accepted, then approved
    ApproveWithLicense,
    /// Left for the second pass
    Defer,
    /// Left alone
    Skip,
}

impl ActionKind {
    /// Label used in the action log.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Delete => "DELETE",
            ActionKind::DeclineArch => "DECLINE-ARCH",
            ActionKind::DeclinePreview => "DECLINE-PREVIEW",
            ActionKind::DeclineBeta => "DECLINE-BETA",
            ActionKind::DeclineLanguage => "DECLINE-LANGUAGE",
            ActionKind::DeclineSuperseded => "DECLINE-SUPERSEDED",
            ActionKind::DeclineExpired => "DECLINE-EXPIRED",
            ActionKind::Approve => "APPROVE",
            ActionKind::ApproveWithLicense => "APPROVE-WITH-LICENSE",
            ActionKind::Defer => "DEFER",
            ActionKind::Skip => "SKIP",
        }
    }

    /// Whether this kind issues a decline call.
    pub fn is_decline(&self) -> bool {
        matches!(
            self,
            ActionKind::DeclineArch
                | ActionKind::DeclinePreview
                | ActionKind::DeclineBeta
                | ActionKind::DeclineLanguage
                | ActionKind::DeclineSuperseded
                | ActionKind::DeclineExpired
        )
    }
}

impl From<Decision> for ActionKind {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Delete => ActionKind::Delete,
            Decision::DeclineArch(_) => ActionKind::DeclineArch,
            Decision::DeclinePreview => ActionKind::DeclinePreview,
            Decision::DeclineBeta => ActionKind::DeclineBeta,
            Decision::DeclineLanguage => ActionKind::DeclineLanguage,
            Decision::DeferSupersededOrExpired => ActionKind::Defer,
            Decision::Approve => ActionKind::Approve,
            Decision::ApproveWithLicense => ActionKind::ApproveWithLicense,
            Decision::Skip => ActionKind::Skip,
        }
    }
}

/// What became of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The call went through
    Done,
    /// Dry run: the call would have been issued
    DryRun,
    /// Nothing to call (skip, defer, already declined)
    NoCall,
    /// The call failed; the run continued
    Failed(String),
}

impl Outcome {
    /// Label used in the action log.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Done => "done",
            Outcome::DryRun => "dry-run",
            Outcome::NoCall => "no-call",
            Outcome::Failed(_) => "failed",
        }
    }
}

/// One line of the action log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    /// Phase that produced the action
    pub phase: Phase,
    /// What was decided
    pub kind: ActionKind,
    /// Extra reason, e.g. the architecture of an architecture decline
    pub detail: Option<String>,
    /// Update the action targets
    pub update_id: UpdateId,
    /// Update title at decision time
    pub title: String,
    /// What became of the call
    pub outcome: Outcome,
}

impl ActionRecord {
    /// Builds a record for `decision` on `update`.
    pub fn new(phase: Phase, decision: Decision, update: &UpdateRecord, outcome: Outcome) -> Self {
        let detail = match decision {
            Decision::DeclineArch(arch) => Some(arch.as_str().to_string()),
            _ => None,
        };
        Self {
            phase,
            kind: ActionKind::from(decision),
            detail,
            update_id: update.id.clone(),
            title: update.title.clone(),
            outcome,
        }
    }

    /// Second-pass decline of a superseded or expired update.
    pub fn resolve(update: &UpdateRecord, outcome: Outcome) -> Self {
        let kind = if update.is_superseded {
            ActionKind::DeclineSuperseded
        } else {
            ActionKind::DeclineExpired
        };
        Self {
            phase: Phase::Resolve,
            kind,
            detail: None,
            update_id: update.id.clone(),
            title: update.title.clone(),
            outcome,
        }
    }

    /// What was intended, independent of whether it was executed.
    pub fn intent(&self) -> (Phase, ActionKind, Option<&str>, &UpdateId) {
        (self.phase, self.kind, self.detail.as_deref(), &self.update_id)
    }
}
