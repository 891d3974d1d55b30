//! Error retriability and retry logic.

use std::future::Future;

use log::warn;
use tokio_retry::RetryIf;

use crate::config::HTTP_STATUS_TOO_MANY_REQUESTS;
use crate::error_handling::{get_retry_strategy, ServerError};

/// Determines if a server error is transient and worth retrying.
///
/// # Retriable Errors
///
/// - Unreachable server (connection refused, DNS failure)
/// - Timeouts and other transport failures while a request was in flight
/// - Server errors (5xx HTTP status codes)
/// - Rate limiting (429 Too Many Requests)
///
/// # Non-Retriable Errors
///
/// - Client errors (4xx HTTP status codes, except 429)
/// - Decode errors (the server answered, with something unexpected)
/// - Unknown updates or groups, explicit rejections
pub(crate) fn is_retriable_error(error: &ServerError) -> bool {
    match error {
        ServerError::Connection { .. } => true,
        ServerError::Request { source, .. } => {
            source.is_timeout() || source.is_connect() || source.is_request()
        }
        ServerError::Status { status, .. } => {
            *status == HTTP_STATUS_TOO_MANY_REQUESTS || (500..600).contains(status)
        }
        ServerError::Decode { .. }
        | ServerError::UpdateNotFound(_)
        | ServerError::GroupNotFound(_)
        | ServerError::Rejected { .. } => false,
    }
}

/// Runs an idempotent remote call, retrying transient failures.
///
/// Only safe for calls the server treats idempotently; every call in
/// [`crate::server::UpdateServer`] qualifies.
pub(crate) async fn retry_idempotent<T, F, Fut>(
    operation: &'static str,
    max_retries: usize,
    action: F,
) -> Result<T, ServerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServerError>>,
{
    RetryIf::start(
        get_retry_strategy().take(max_retries),
        action,
        |e: &ServerError| {
            let retry = is_retriable_error(e);
            if retry {
                warn!("{operation} failed, retrying: {e}");
            }
            retry
        },
    )
    .await
}
