//! Prune command implementation.

use super::open_store;
use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::prune_missing;
use anyhow::Result;

/// Run the prune command.
pub async fn run_prune(settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;

    let removed = prune_missing(store.as_ref()).await?;
    if removed == 0 {
        Output::info("Every indexed sample still exists on disk.");
    } else {
        Output::success(&format!("Removed {} samples whose files are gone", removed));
    }

    Ok(())
}
