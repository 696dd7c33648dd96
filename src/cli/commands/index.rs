//! Index command implementation.

use super::{create_embedder, open_or_create_store};
use crate::cli::Output;
use crate::config::{parse_duration_limit, Settings};
use crate::indexer::Indexer;
use anyhow::Result;
use std::path::Path;

/// Run the index command.
pub async fn run_index(
    folder: &str,
    max_duration: Option<f64>,
    concurrency: Option<usize>,
    settings: Settings,
) -> Result<()> {
    let store = open_or_create_store(&settings)?;
    let embedder = create_embedder(&settings)?;

    let mut indexer = Indexer::from_settings(&settings, embedder, store)?;
    if let Some(seconds) = max_duration {
        indexer = indexer.with_max_duration(parse_duration_limit(seconds)?);
    }
    if let Some(n) = concurrency {
        indexer = indexer.with_concurrency(n);
    }

    let token = indexer.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            Output::warning("Stopping after the files in progress...");
            token.cancel();
        }
    });

    Output::info(&format!("Indexing {}", folder));

    let bar = Output::percent_bar("embedding");
    let result = indexer
        .run_indexing(Path::new(folder), |progress| {
            bar.set_position(u64::from(progress.percent()));
            bar.set_message(format!("{}/{}", progress.completed, progress.total));
        })
        .await;
    bar.finish_and_clear();

    match result {
        Ok(0) => Output::info("No new samples were indexed."),
        Ok(count) => Output::success(&format!("Indexed {} new samples", count)),
        Err(e) => {
            Output::error(&format!("Indexing failed: {}", e));
            return Err(e.into());
        }
    }

    if indexer.cancel_token().is_cancelled() {
        Output::warning("Indexing was interrupted; run again to finish the folder.");
    }

    let total = indexer.vector_store().count().await?;
    Output::kv("Samples in library", &total.to_string());

    Ok(())
}
