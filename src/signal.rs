use std::future::Future;
use std::io;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancels `cancel` once `interrupt` resolves.
///
/// A failed listener also cancels: without it the run could never be stopped
/// cleanly, so it ends right away and says why.
pub async fn cancel_on_interrupt<F>(interrupt: F, cancel: CancellationToken)
where
    F: Future<Output = io::Result<()>>,
{
    match interrupt.await {
        Ok(()) => info!("Ctrl+C pressed in Terminal"),
        Err(e) => error!("cannot listen for Ctrl+C, stopping: {}", e),
    }
    cancel.cancel();
}
