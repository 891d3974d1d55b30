//! Records mirrored from the WSUS server.
//!
//! These are read-only snapshots; the server owns the real objects and every
//! change goes through [`super::UpdateServer`].

use serde::{Deserialize, Serialize};

/// Opaque update identity assigned by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateId(pub String);

impl UpdateId {
    /// Borrowed id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UpdateId {
    fn from(s: &str) -> Self {
        UpdateId(s.to_string())
    }
}

impl std::fmt::Display for UpdateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Publication state of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PublicationState {
    /// Published and current
    #[default]
    Active,
    /// Withdrawn by the publisher
    Expired,
    /// Any state the curator does not act on
    #[serde(other)]
    Other,
}

/// One update as the server reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRecord {
    /// Server-assigned identity
    pub id: UpdateId,
    /// Display title
    pub title: String,
    /// Older internal name, sometimes the only place "ia64" shows up
    pub legacy_name: String,
    /// Classification, e.g. "Security Updates"
    pub classification_title: String,
    /// Products the update applies to
    pub product_titles: Vec<String>,
    /// Approved for at least one group
    pub is_approved: bool,
    /// Declined
    pub is_declined: bool,
    /// Published as beta
    pub is_beta: bool,
    /// Replaced by a newer update
    pub is_superseded: bool,
    /// Update to WSUS itself
    pub is_wsus_infrastructure_update: bool,
    /// A license agreement must be accepted before approval
    pub requires_license_agreement_acceptance: bool,
    /// Publication state
    pub publication_state: PublicationState,
    /// Language tag, if the server reports one
    pub locale: Option<String>,
}

impl UpdateRecord {
    /// Superseded and expired updates are declined only after approvals.
    pub fn is_superseded_or_expired(&self) -> bool {
        self.is_superseded || self.publication_state == PublicationState::Expired
    }
}

/// Synchronization state of the server subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// No synchronization in progress
    Idle,
    /// Synchronization in progress
    Running,
}

/// Classification or product category the subscription covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Server-assigned id
    pub id: String,
    /// Title used for membership tests
    pub title: String,
}

/// Computer group approvals can target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputerGroup {
    /// Server-assigned id
    pub id: String,
    /// Group name
    pub name: String,
}

/// Approval action passed along with an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalAction {
    /// Install on the group's computers
    Install,
}
