//! Run statistics.
//!
//! Counts actions per kind and mutation failures per call type. Every
//! variant is present from the start so summaries always list all of them.

use std::collections::HashMap;

use strum::IntoEnumIterator;

use super::types::MutationKind;
use crate::audit::{ActionKind, ActionRecord, Outcome};

/// Per-run action and failure counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    actions: HashMap<ActionKind, usize>,
    failures: HashMap<MutationKind, usize>,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    /// Creates empty counters for every action and mutation kind.
    pub fn new() -> Self {
        RunStats {
            actions: ActionKind::iter().map(|k| (k, 0)).collect(),
            failures: MutationKind::iter().map(|k| (k, 0)).collect(),
        }
    }

    /// Counts a logged action.
    pub fn record(&mut self, action: &ActionRecord) {
        *self.actions.entry(action.kind).or_insert(0) += 1;
    }

    /// Counts a failed server mutation.
    pub fn record_failure(&mut self, kind: MutationKind) {
        *self.failures.entry(kind).or_insert(0) += 1;
    }

    /// Number of actions logged with `kind`.
    pub fn action_count(&self, kind: ActionKind) -> usize {
        self.actions.get(&kind).copied().unwrap_or(0)
    }

    /// Number of failed `kind` calls.
    pub fn failure_count(&self, kind: MutationKind) -> usize {
        self.failures.get(&kind).copied().unwrap_or(0)
    }

    /// All logged actions, skips and deferrals included.
    pub fn total_actions(&self) -> usize {
        self.actions.values().sum()
    }

    /// All failed mutations.
    pub fn total_failures(&self) -> usize {
        self.failures.values().sum()
    }

    /// Actions that changed (or in a dry run, would change) server state.
    pub fn total_changes(&self) -> usize {
        ActionKind::iter()
            .filter(|k| !matches!(k, ActionKind::Skip | ActionKind::Defer))
            .map(|k| self.action_count(k))
            .sum()
    }

    /// Rebuilds the counters from a finished action list.
    pub fn from_actions<'a>(actions: impl IntoIterator<Item = &'a ActionRecord>) -> Self {
        let mut stats = Self::new();
        for action in actions {
            stats.record(action);
        }
        stats
    }

    /// Number of actions whose outcome was a failure.
    pub fn failed_actions<'a>(actions: impl IntoIterator<Item = &'a ActionRecord>) -> usize {
        actions
            .into_iter()
            .filter(|a| matches!(a.outcome, Outcome::Failed(_)))
            .count()
    }
}
