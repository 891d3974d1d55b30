//! Graceful shutdown handling.

use log::warn;
use tokio_util::sync::CancellationToken;

/// Returns a token that is cancelled when the process receives Ctrl-C.
///
/// The run checks the token between updates and while waiting on the sync
/// gate, so an interrupt stops it at a point the action log fully describes.
/// Must be called from inside a Tokio runtime.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupt received, stopping after the current update");
                token.cancel();
            }
            Err(e) => warn!("Cannot listen for Ctrl-C: {e}"),
        }
    });
    cancel
}
