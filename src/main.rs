use anyhow::Result;
use runtally::{cli::run_cli, utils::runtime::block_on_current_thread};
use tracing::error;

fn main() -> Result<()> {
    block_on_current_thread(run_cli())?.inspect_err(|e| {
        error!("Error running cli {e:?}");
    })?;
    Ok(())
}
