//! List command implementation.

use super::open_store;
use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::VectorStore;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let store = match open_store(&settings) {
        Ok(store) => store,
        Err(e) if e.is_store_unavailable() => {
            Output::info("No samples indexed yet. Use 'sampledex index <folder>' to add content.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let samples = store.list().await?;
    if samples.is_empty() {
        Output::info("No samples indexed yet. Use 'sampledex index <folder>' to add content.");
        return Ok(());
    }

    Output::header(&format!("Indexed Samples ({})", samples.len()));
    println!();

    for sample in &samples {
        Output::sample_info(
            sample.filename.as_deref(),
            &sample.identity,
            sample.duration_seconds,
        );
    }

    let total_seconds: f64 = samples.iter().filter_map(|s| s.duration_seconds).sum();
    println!();
    Output::kv("Total samples", &samples.len().to_string());
    Output::kv("Total audio", &format!("{:.1}s", total_seconds));

    Ok(())
}
