//! HTTP/JSON client for the WSUS administration gateway.

use std::net::IpAddr;
use std::sync::Arc;

use log::debug;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::types::{
    ApprovalAction, ComputerGroup, Descriptor, SyncStatus, UpdateId, UpdateRecord,
};
use super::UpdateServer;
use crate::config::{Config, RETRY_MAX_ATTEMPTS};
use crate::error_handling::{ConfigError, ServerError};
use crate::utils::retry_idempotent;

/// Identity reported by the gateway on connect.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerInfo {
    /// Server name
    pub name: String,
    /// Server version, empty if not reported
    #[serde(default)]
    pub version: String,
}

#[derive(Deserialize)]
struct SyncStatusBody {
    status: SyncStatus,
}

/// [`UpdateServer`] backed by the administration gateway's JSON API.
///
/// Every call is retried with exponential backoff on transient failures
/// (timeouts, refused connections, 5xx, 429). Client errors are returned
/// immediately.
#[derive(Debug, Clone)]
pub struct RemoteServer {
    client: Arc<reqwest::Client>,
    base: Url,
    token: Option<String>,
    max_retries: usize,
}

impl RemoteServer {
    /// `{http|https}://{server}:{port}/api/` for the configured target.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidServerUrl` if the server name does not
    /// form a valid host.
    pub fn base_url(config: &Config) -> Result<Url, ConfigError> {
        let scheme = if config.use_tls { "https" } else { "http" };
        let server = config.server.trim();
        // IPv6 literals need brackets in the authority
        let host = match server.parse::<IpAddr>() {
            Ok(IpAddr::V6(addr)) => format!("[{addr}]"),
            _ => server.to_string(),
        };
        let raw = format!("{}://{}:{}/api/", scheme, host, config.effective_port());
        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidServerUrl(format!("{raw}: {e}")))?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err(ConfigError::InvalidServerUrl(raw));
        }
        Ok(url)
    }

    /// Client for the gateway at `base`, sending `token` as a bearer token if set.
    pub fn new(client: Arc<reqwest::Client>, base: Url, token: Option<String>) -> Self {
        Self {
            client,
            base,
            token,
            max_retries: RETRY_MAX_ATTEMPTS,
        }
    }

    /// Limits how often a transient failure is retried (0 disables retries).
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Probes the gateway and returns the server identity.
    ///
    /// A failure here is fatal for the run: nothing has been mutated yet.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Connection` if the server cannot be reached, or
    /// `ServerError::Status` if it rejects the request (e.g. bad credentials).
    pub async fn connect(&self) -> Result<ServerInfo, ServerError> {
        let info: ServerInfo = self.get_json("Connect", &["server"]).await?;
        debug!("Connected to {} ({})", info.name, self.base);
        Ok(info)
    }

    /// Base URL every endpoint is resolved against.
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn transport_error(&self, operation: &'static str, error: reqwest::Error) -> ServerError {
        if error.is_connect() {
            ServerError::Connection {
                endpoint: self.base.to_string(),
                source: error,
            }
        } else {
            ServerError::Request {
                operation,
                source: error,
            }
        }
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ServerError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(operation, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServerError::Status {
                operation,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        segments: &[&str],
    ) -> Result<T, ServerError> {
        let url = &self.endpoint(segments);
        let this = self;
        retry_idempotent(operation, self.max_retries, move || async move {
            let response = this.send(operation, this.client.get(url.clone())).await?;
            response
                .json::<T>()
                .await
                .map_err(|source| ServerError::Decode { operation, source })
        })
        .await
    }

    /// POST/DELETE against one update, mapping 404 to `UpdateNotFound`.
    async fn mutate(
        &self,
        operation: &'static str,
        method: reqwest::Method,
        id: &UpdateId,
        action: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Result<(), ServerError> {
        let mut segments = vec!["updates", id.as_str()];
        segments.extend(action);
        let url = &self.endpoint(&segments);
        let body = &body;
        let method = &method;
        let this = self;
        let result = retry_idempotent(operation, self.max_retries, move || async move {
            let mut request = this.client.request(method.clone(), url.clone());
            if let Some(body) = body {
                request = request.json(body);
            }
            this.send(operation, request).await.map(|_| ())
        })
        .await;

        match result {
            Err(ServerError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(ServerError::UpdateNotFound(id.clone()))
            }
            other => other,
        }
    }
}

impl UpdateServer for RemoteServer {
    async fn computer_groups(&self) -> Result<Vec<ComputerGroup>, ServerError> {
        self.get_json("GetComputerGroups", &["computer-groups"])
            .await
    }

    async fn subscribed_classifications(&self) -> Result<Vec<Descriptor>, ServerError> {
        self.get_json("GetClassifications", &["subscription", "classifications"])
            .await
    }

    async fn subscribed_categories(&self) -> Result<Vec<Descriptor>, ServerError> {
        self.get_json("GetCategories", &["subscription", "categories"])
            .await
    }

    async fn sync_status(&self) -> Result<SyncStatus, ServerError> {
        let body: SyncStatusBody = self
            .get_json("GetSyncStatus", &["subscription", "sync-status"])
            .await?;
        Ok(body.status)
    }

    async fn start_sync(&self) -> Result<(), ServerError> {
        let url = &self.endpoint(&["subscription", "sync"]);
        let this = self;
        retry_idempotent("StartSync", self.max_retries, move || async move {
            this.send("StartSync", this.client.post(url.clone()))
                .await
                .map(|_| ())
        })
        .await
    }

    async fn all_updates(&self) -> Result<Vec<UpdateRecord>, ServerError> {
        self.get_json("GetAllUpdates", &["updates"]).await
    }

    async fn delete_update(&self, id: &UpdateId) -> Result<(), ServerError> {
        match self
            .mutate("DeleteUpdate", reqwest::Method::DELETE, id, None, None)
            .await
        {
            // Already gone: a retried delete lands here
            Err(ServerError::UpdateNotFound(_)) => Ok(()),
            other => other,
        }
    }

    async fn decline_update(&self, id: &UpdateId) -> Result<(), ServerError> {
        self.mutate(
            "DeclineUpdate",
            reqwest::Method::POST,
            id,
            Some("decline"),
            None,
        )
        .await
    }

    async fn accept_license_agreement(&self, id: &UpdateId) -> Result<(), ServerError> {
        self.mutate(
            "AcceptLicenseAgreement",
            reqwest::Method::POST,
            id,
            Some("accept-license"),
            None,
        )
        .await
    }

    async fn approve_update(
        &self,
        id: &UpdateId,
        action: ApprovalAction,
        group: &ComputerGroup,
    ) -> Result<(), ServerError> {
        self.mutate(
            "ApproveUpdate",
            reqwest::Method::POST,
            id,
            Some("approve"),
            Some(json!({ "action": action, "targetGroupId": group.id })),
        )
        .await
    }
}
