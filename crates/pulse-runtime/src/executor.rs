//! Process-level async runtime for a single batch run.

use std::future::Future;
use std::time::Duration;

use pulse_core::Result;
use tracing::debug;

/// How long shutdown waits for blocking work left behind by a finished run.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Drive `future` to completion on a fresh multi-threaded runtime.
///
/// Scorer calls abandoned after a timeout keep running on the blocking
/// pool; shutdown waits at most `grace` for them and then detaches them,
/// so the caller always gets control back.
pub fn block_on_bounded<F: Future>(future: F, grace: Duration) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    debug!("Shutting down runtime (grace {:?})", grace);
    runtime.shutdown_timeout(grace);
    Ok(output)
}
