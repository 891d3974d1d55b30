//! The WSUS administration API, seen from this tool.
//!
//! The server owns the catalog, the subscription and the sync machinery.
//! Everything the run needs from it goes through [`UpdateServer`]:
//! - [`RemoteServer`]: JSON over HTTP(S) to the administration gateway
//! - [`InMemoryServer`]: a self-contained catalog for tests and rehearsals

mod memory;
mod remote;
mod types;

use std::collections::BTreeSet;

pub use memory::{InMemoryServer, ServerCall};
pub use remote::{RemoteServer, ServerInfo};
pub use types::{
    ApprovalAction, ComputerGroup, Descriptor, PublicationState, SyncStatus, UpdateId,
    UpdateRecord,
};

use crate::error_handling::ServerError;

/// Operations the curation run issues against a WSUS server.
///
/// Mutations are idempotent on the server side: declining a declined update
/// or deleting a missing one twice leaves the catalog unchanged.
#[allow(async_fn_in_trait)]
pub trait UpdateServer {
    /// Computer groups defined on the server.
    async fn computer_groups(&self) -> Result<Vec<ComputerGroup>, ServerError>;

    /// Classifications the subscription synchronizes.
    async fn subscribed_classifications(&self) -> Result<Vec<Descriptor>, ServerError>;

    /// Product categories the subscription synchronizes.
    async fn subscribed_categories(&self) -> Result<Vec<Descriptor>, ServerError>;

    /// Current synchronization state.
    async fn sync_status(&self) -> Result<SyncStatus, ServerError>;

    /// Asks the server to synchronize now.
    async fn start_sync(&self) -> Result<(), ServerError>;

    /// Every update in the catalog, declined ones included.
    async fn all_updates(&self) -> Result<Vec<UpdateRecord>, ServerError>;

    /// Removes an update from the catalog.
    async fn delete_update(&self, id: &UpdateId) -> Result<(), ServerError>;

    /// Declines an update.
    async fn decline_update(&self, id: &UpdateId) -> Result<(), ServerError>;

    /// Accepts the license agreement of an update.
    async fn accept_license_agreement(&self, id: &UpdateId) -> Result<(), ServerError>;

    /// Approves an update for a computer group.
    async fn approve_update(
        &self,
        id: &UpdateId,
        action: ApprovalAction,
        group: &ComputerGroup,
    ) -> Result<(), ServerError>;

    /// Looks a computer group up by exact name.
    async fn find_group(&self, name: &str) -> Result<ComputerGroup, ServerError> {
        self.computer_groups()
            .await?
            .into_iter()
            .find(|g| g.name == name)
            .ok_or_else(|| ServerError::GroupNotFound(name.to_string()))
    }

    /// Updates that are not declined.
    async fn undeclined_updates(&self) -> Result<Vec<UpdateRecord>, ServerError> {
        Ok(self
            .all_updates()
            .await?
            .into_iter()
            .filter(|u| !u.is_declined)
            .collect())
    }
}

/// Titles of the subscription's classifications and categories.
///
/// Membership tests against these are exact string comparisons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscription {
    /// Subscribed classification titles
    pub classifications: BTreeSet<String>,
    /// Subscribed product category titles
    pub categories: BTreeSet<String>,
}

impl Subscription {
    /// Fetches both title sets once.
    pub async fn fetch<S: UpdateServer>(server: &S) -> Result<Self, ServerError> {
        let classifications = server
            .subscribed_classifications()
            .await?
            .into_iter()
            .map(|d| d.title)
            .collect();
        let categories = server
            .subscribed_categories()
            .await?
            .into_iter()
            .map(|d| d.title)
            .collect();
        Ok(Self {
            classifications,
            categories,
        })
    }
}
