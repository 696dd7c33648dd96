//! Search command implementation.

use super::{create_embedder, open_store};
use crate::cli::Output;
use crate::config::Settings;
use crate::search::QueryEngine;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, top_k: Option<usize>, settings: Settings) -> Result<()> {
    let store = match open_store(&settings) {
        Ok(store) => store,
        Err(e) if e.is_store_unavailable() => {
            Output::error(&e.to_string());
            Output::info("No library yet. Use 'sampledex index <folder>' first.");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    let engine = QueryEngine::new(create_embedder(&settings)?, store);

    let top_k = top_k.unwrap_or(settings.search.top_k);
    let spinner = Output::spinner("Searching...");
    let results = engine.search(query, top_k).await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) if hits.is_empty() => {
            Output::warning("No results found matching your query.");
        }
        Ok(hits) => {
            println!("{}", "-".repeat(50));
            println!("Top {} Results:", hits.len());
            println!("{}", "-".repeat(50));
            for (i, hit) in hits.iter().enumerate() {
                Output::search_result(i + 1, hit);
                println!();
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
