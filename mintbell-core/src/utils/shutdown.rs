//! Helpers for the cooperative shutdown signal.
//!
//! Every long-running task receives a `watch::Receiver<bool>`; `true` means
//! "stop at the next loop or sleep boundary". A dropped sender is treated
//! the same as `true`.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Whether shutdown has been requested.
pub fn is_shutdown(shutdown_rx: &watch::Receiver<bool>) -> bool {
    *shutdown_rx.borrow() || shutdown_rx.has_changed().is_err()
}

/// Resolve once shutdown is requested.
pub async fn wait_for_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    // Err means the sender is gone, which also ends the wait.
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}

/// Sleep for `duration` unless shutdown arrives first.
///
/// Returns `true` if the sleep was cut short by shutdown.
pub async fn sleep_or_shutdown(shutdown_rx: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    tokio::select! {
        biased;
        _ = wait_for_shutdown(shutdown_rx) => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

/// Run `fut` unless shutdown arrives first.
///
/// Returns `None` if the future was abandoned.
pub async fn or_shutdown<F: Future>(
    shutdown_rx: &mut watch::Receiver<bool>,
    fut: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = wait_for_shutdown(shutdown_rx) => None,
        out = fut => Some(out),
    }
}
