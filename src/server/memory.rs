//! In-memory WSUS double.
//!
//! Holds a catalog, a subscription and a scripted sync status, and records
//! every mutating call in order. Approving an update marks the updates it
//! supersedes as superseded, the way the real server reports them after an
//! approval.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use super::types::{
    ApprovalAction, ComputerGroup, Descriptor, SyncStatus, UpdateId, UpdateRecord,
};
use super::UpdateServer;
use crate::error_handling::{MutationKind, ServerError};

/// A call that changed (or tried to change) server state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCall {
    /// Sync requested
    StartSync,
    /// Update deleted
    Delete(UpdateId),
    /// Update declined
    Decline(UpdateId),
    /// License accepted
    AcceptLicense(UpdateId),
    /// Update approved for the named group
    Approve(UpdateId, String),
}

#[derive(Debug, Clone)]
struct Entry {
    record: UpdateRecord,
    supersedes: Vec<UpdateId>,
}

#[derive(Debug, Default)]
struct State {
    updates: Vec<Entry>,
    classifications: Vec<Descriptor>,
    categories: Vec<Descriptor>,
    groups: Vec<ComputerGroup>,
    /// Status returned by successive polls; the last one sticks
    sync_script: VecDeque<SyncStatus>,
    calls: Vec<ServerCall>,
    failing: HashSet<(MutationKind, UpdateId)>,
    unreachable: bool,
}

/// [`UpdateServer`] over a catalog held in memory.
#[derive(Debug, Default)]
pub struct InMemoryServer {
    state: Mutex<State>,
}

fn descriptors(titles: &[&str]) -> Vec<Descriptor> {
    titles
        .iter()
        .enumerate()
        .map(|(i, t)| Descriptor {
            id: format!("d{i}"),
            title: t.to_string(),
        })
        .collect()
}

impl InMemoryServer {
    /// Empty catalog, idle sync, no groups.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Subscribes to these classifications.
    pub fn with_classifications(self, titles: &[&str]) -> Self {
        self.lock().classifications = descriptors(titles);
        self
    }

    /// Subscribes to these product categories.
    pub fn with_categories(self, titles: &[&str]) -> Self {
        self.lock().categories = descriptors(titles);
        self
    }

    /// Adds a computer group.
    pub fn with_group(self, name: &str) -> Self {
        {
            let mut state = self.lock();
            let id = format!("g{}", state.groups.len());
            state.groups.push(ComputerGroup {
                id,
                name: name.to_string(),
            });
        }
        self
    }

    /// Adds an update to the catalog.
    pub fn with_update(self, record: UpdateRecord) -> Self {
        self.with_superseding_update(record, &[])
    }

    /// Adds an update that, once approved, supersedes `supersedes`.
    pub fn with_superseding_update(self, record: UpdateRecord, supersedes: &[&str]) -> Self {
        self.lock().updates.push(Entry {
            record,
            supersedes: supersedes.iter().map(|s| UpdateId::from(*s)).collect(),
        });
        self
    }

    /// Statuses reported by successive polls; the last repeats forever.
    pub fn with_sync_statuses(self, statuses: &[SyncStatus]) -> Self {
        self.lock().sync_script = statuses.iter().copied().collect();
        self
    }

    /// Makes one kind of mutation fail for one update.
    pub fn failing(self, kind: MutationKind, id: &str) -> Self {
        self.lock().failing.insert((kind, UpdateId::from(id)));
        self
    }

    /// Every call fails as if the server were down.
    pub fn unreachable(self) -> Self {
        self.lock().unreachable = true;
        self
    }

    /// Mutating calls received so far, in order.
    pub fn calls(&self) -> Vec<ServerCall> {
        self.lock().calls.clone()
    }

    /// Forgets the calls recorded so far.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Current snapshot of one update.
    pub fn update(&self, id: &str) -> Option<UpdateRecord> {
        let id = UpdateId::from(id);
        self.lock()
            .updates
            .iter()
            .find(|e| e.record.id == id)
            .map(|e| e.record.clone())
    }

    fn check_reachable(state: &State, operation: &'static str) -> Result<(), ServerError> {
        if state.unreachable {
            return Err(ServerError::Rejected {
                operation,
                reason: "server unreachable".to_string(),
            });
        }
        Ok(())
    }

    /// Shared prologue of the update mutations: record, fail if scripted, find the entry.
    fn mutate_entry<F>(
        &self,
        operation: &'static str,
        kind: MutationKind,
        call: ServerCall,
        id: &UpdateId,
        apply: F,
    ) -> Result<(), ServerError>
    where
        F: FnOnce(&mut State, usize),
    {
        let mut state = self.lock();
        Self::check_reachable(&state, operation)?;
        state.calls.push(call);
        if state.failing.contains(&(kind, id.clone())) {
            return Err(ServerError::Rejected {
                operation,
                reason: "scripted failure".to_string(),
            });
        }
        let index = state
            .updates
            .iter()
            .position(|e| &e.record.id == id)
            .ok_or_else(|| ServerError::UpdateNotFound(id.clone()))?;
        apply(&mut state, index);
        Ok(())
    }
}

impl UpdateServer for InMemoryServer {
    async fn computer_groups(&self) -> Result<Vec<ComputerGroup>, ServerError> {
        let state = self.lock();
        Self::check_reachable(&state, "GetComputerGroups")?;
        Ok(state.groups.clone())
    }

    async fn subscribed_classifications(&self) -> Result<Vec<Descriptor>, ServerError> {
        let state = self.lock();
        Self::check_reachable(&state, "GetClassifications")?;
        Ok(state.classifications.clone())
    }

    async fn subscribed_categories(&self) -> Result<Vec<Descriptor>, ServerError> {
        let state = self.lock();
        Self::check_reachable(&state, "GetCategories")?;
        Ok(state.categories.clone())
    }

    async fn sync_status(&self) -> Result<SyncStatus, ServerError> {
        let mut state = self.lock();
        Self::check_reachable(&state, "GetSyncStatus")?;
        let status = if state.sync_script.len() > 1 {
            state.sync_script.pop_front()
        } else {
            state.sync_script.front().copied()
        };
        Ok(status.unwrap_or(SyncStatus::Idle))
    }

    async fn start_sync(&self) -> Result<(), ServerError> {
        let mut state = self.lock();
        Self::check_reachable(&state, "StartSync")?;
        state.calls.push(ServerCall::StartSync);
        if state.sync_script.is_empty() {
            state.sync_script = VecDeque::from([SyncStatus::Running, SyncStatus::Idle]);
        }
        Ok(())
    }

    async fn all_updates(&self) -> Result<Vec<UpdateRecord>, ServerError> {
        let state = self.lock();
        Self::check_reachable(&state, "GetAllUpdates")?;
        Ok(state.updates.iter().map(|e| e.record.clone()).collect())
    }

    async fn delete_update(&self, id: &UpdateId) -> Result<(), ServerError> {
        let mut state = self.lock();
        Self::check_reachable(&state, "DeleteUpdate")?;
        state.calls.push(ServerCall::Delete(id.clone()));
        if state.failing.contains(&(MutationKind::Delete, id.clone())) {
            return Err(ServerError::Rejected {
                operation: "DeleteUpdate",
                reason: "scripted failure".to_string(),
            });
        }
        state.updates.retain(|e| &e.record.id != id);
        Ok(())
    }

    async fn decline_update(&self, id: &UpdateId) -> Result<(), ServerError> {
        self.mutate_entry(
            "DeclineUpdate",
            MutationKind::Decline,
            ServerCall::Decline(id.clone()),
            id,
            |state, i| {
                let record = &mut state.updates[i].record;
                record.is_declined = true;
                record.is_approved = false;
            },
        )
    }

    async fn accept_license_agreement(&self, id: &UpdateId) -> Result<(), ServerError> {
        self.mutate_entry(
            "AcceptLicenseAgreement",
            MutationKind::AcceptLicense,
            ServerCall::AcceptLicense(id.clone()),
            id,
            |state, i| {
                state.updates[i].record.requires_license_agreement_acceptance = false;
            },
        )
    }

    async fn approve_update(
        &self,
        id: &UpdateId,
        _action: ApprovalAction,
        group: &ComputerGroup,
    ) -> Result<(), ServerError> {
        let license_pending = self
            .update(id.as_str())
            .is_some_and(|u| u.requires_license_agreement_acceptance);
        if license_pending {
            return Err(ServerError::Rejected {
                operation: "ApproveUpdate",
                reason: "license agreement not accepted".to_string(),
            });
        }
        self.mutate_entry(
            "ApproveUpdate",
            MutationKind::Approve,
            ServerCall::Approve(id.clone(), group.name.clone()),
            id,
            |state, i| {
                let superseded = state.updates[i].supersedes.clone();
                let record = &mut state.updates[i].record;
                record.is_approved = true;
                record.is_declined = false;
                for entry in state.updates.iter_mut() {
                    if superseded.contains(&entry.record.id) {
                        entry.record.is_superseded = true;
                    }
                }
            },
        )
    }
}
