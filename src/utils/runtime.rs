use std::future::Future;

use anyhow::{Context, Result};

/// Drives `future` to completion on a current-thread runtime. Every step of a run is awaited in
/// sequence, so no worker threads are started.
pub fn block_on_current_thread<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    Ok(runtime.block_on(future))
}
