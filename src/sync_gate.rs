//! Synchronization gate.
//!
//! The catalog must not be read or mutated while the server is synchronizing,
//! whoever started the sync. The gate optionally starts one, then polls until
//! the server reports idle. The wait is bounded and cancellable, and uses
//! `tokio::time` so tests drive it with paused virtual time.

use std::time::Duration;

use log::{debug, info};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, SYNC_START_GRACE_POLLS};
use crate::error_handling::SyncError;
use crate::server::{SyncStatus, UpdateServer};

/// What the gate did before letting the run through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Whether this run started a synchronization
    pub started: bool,
    /// Status polls made after the first one
    pub polls: u32,
    /// Time between the first status read and release
    pub waited: Duration,
}

/// Bounded, cancellable wait for the server's sync to go idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncGate {
    poll_interval: Duration,
    max_wait: Duration,
}

impl SyncGate {
    /// Gate polling every `poll_interval` for at most `max_wait`.
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            poll_interval,
            max_wait,
        }
    }

    /// Gate using the configured poll interval and timeout.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sync_poll_interval(), config.sync_max_wait())
    }

    /// Starts a sync if `request_sync` and the server is idle, then waits for idle.
    ///
    /// With `request_sync` false the gate still waits out a sync someone
    /// else started.
    ///
    /// # Errors
    ///
    /// - `SyncError::Timeout` if idle is not observed within the maximum wait
    /// - `SyncError::Cancelled` if `cancel` fires while waiting
    /// - `SyncError::Server` if the status cannot be read or the sync cannot be started
    pub async fn wait_until_idle<S: UpdateServer>(
        &self,
        server: &S,
        request_sync: bool,
        cancel: &CancellationToken,
    ) -> Result<SyncOutcome, SyncError> {
        let start = Instant::now();
        let mut status = server.sync_status().await?;
        let mut started = false;

        if request_sync && status == SyncStatus::Idle {
            info!("Starting synchronization");
            server.start_sync().await?;
            started = true;
            status = server.sync_status().await?;
        } else if status == SyncStatus::Running {
            info!("Synchronization already in progress, waiting for it to finish");
        }

        let mut seen_running = status == SyncStatus::Running;
        let mut polls = 0;
        loop {
            // A sync we just requested may still report idle until the server picks it up
            let settled = !started || seen_running || polls >= SYNC_START_GRACE_POLLS;
            if status == SyncStatus::Idle && settled {
                break;
            }
            let waited = start.elapsed();
            if waited >= self.max_wait {
                return Err(SyncError::Timeout { waited });
            }
            let nap = self.poll_interval.min(self.max_wait - waited);
            tokio::select! {
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                _ = sleep(nap) => {}
            }
            polls += 1;
            status = server.sync_status().await?;
            seen_running |= status == SyncStatus::Running;
            debug!("Sync status after {:?}: {:?}", start.elapsed(), status);
        }

        Ok(SyncOutcome {
            started,
            polls,
            waited: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{InMemoryServer, ServerCall};
    use SyncStatus::{Idle, Running};

    fn gate() -> SyncGate {
        SyncGate::new(Duration::from_secs(10), Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_server_starts_sync_and_waits() {
        let server = InMemoryServer::new().with_sync_statuses(&[Idle, Running, Running, Idle]);
        let outcome = gate()
            .wait_until_idle(&server, true, &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.started);
        assert_eq!(outcome.polls, 2);
        assert_eq!(outcome.waited, Duration::from_secs(20));
        assert_eq!(server.calls(), vec![ServerCall::StartSync]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_sync_is_awaited_even_if_status_lags() {
        let server = InMemoryServer::new().with_sync_statuses(&[Idle, Idle, Running, Idle]);
        let outcome = gate()
            .wait_until_idle(&server, true, &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.started);
        assert_eq!(outcome.polls, 2);
        assert_eq!(outcome.waited, Duration::from_secs(20));
        assert_eq!(server.sync_status().await.unwrap(), Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_sync_not_running_yet_holds_the_gate() {
        let server =
            InMemoryServer::new().with_sync_statuses(&[Idle, Idle, Idle, Running, Running, Idle]);
        let outcome = gate()
            .wait_until_idle(&server, true, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.polls, 4);
        assert_eq!(server.sync_status().await.unwrap(), Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_sync_never_seen_running_releases_after_grace() {
        let server = InMemoryServer::new().with_sync_statuses(&[Idle]);
        let outcome = gate()
            .wait_until_idle(&server, true, &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.started);
        assert_eq!(outcome.polls, SYNC_START_GRACE_POLLS);
        assert_eq!(outcome.waited, Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sync_still_waits_for_foreign_sync() {
        let server = InMemoryServer::new().with_sync_statuses(&[Running, Running, Idle]);
        let outcome = gate()
            .wait_until_idle(&server, false, &CancellationToken::new())
            .await
            .unwrap();
        assert!(!outcome.started);
        assert_eq!(outcome.polls, 2);
        assert!(server.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_server_is_not_asked_to_sync_again() {
        let server = InMemoryServer::new().with_sync_statuses(&[Running, Idle]);
        let outcome = gate()
            .wait_until_idle(&server, true, &CancellationToken::new())
            .await
            .unwrap();
        assert!(!outcome.started);
        assert!(server.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sync_on_idle_server_returns_immediately() {
        let server = InMemoryServer::new().with_sync_statuses(&[Idle]);
        let outcome = gate()
            .wait_until_idle(&server, false, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.polls, 0);
        assert_eq!(outcome.waited, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_sync_times_out() {
        let server = InMemoryServer::new().with_sync_statuses(&[Running]);
        let err = gate()
            .wait_until_idle(&server, false, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            SyncError::Timeout { waited } => assert_eq!(waited, Duration::from_secs(60)),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_poll_is_clamped_to_max_wait() {
        let gate = SyncGate::new(Duration::from_secs(40), Duration::from_secs(60));
        let server = InMemoryServer::new().with_sync_statuses(&[Running]);
        let err = gate
            .wait_until_idle(&server, false, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Timeout { waited } if waited == Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait() {
        let server = InMemoryServer::new().with_sync_statuses(&[Running]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = gate()
            .wait_until_idle(&server, false, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_server_is_a_sync_error() {
        let server = InMemoryServer::new().unreachable();
        let err = gate()
            .wait_until_idle(&server, true, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Server(_)));
    }
}
