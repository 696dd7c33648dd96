//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::{Embedder, HttpEmbedder};
use crate::vector_store::{SqliteVectorStore, VectorStore};
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Sampledex Doctor");
    println!();
    println!("Checking services and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Embedding Service").bold());
    let embed_check = check_embedder(settings).await;
    embed_check.print();
    checks.push(embed_check);

    println!();

    println!("{}", style("Sample Library").bold());
    let store_check = check_store(settings).await;
    store_check.print();
    checks.push(store_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Sampledex.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Sampledex is ready to use.");
    }

    Ok(())
}

/// Check that the embedding service answers and its model is loaded.
async fn check_embedder(settings: &Settings) -> CheckResult {
    let hint = "Start the embedding service or set [embedding] endpoint in the config";
    let embedder = match HttpEmbedder::with_config(&settings.embedding) {
        Ok(embedder) => embedder,
        Err(e) => return CheckResult::error("Endpoint", &e.to_string(), hint),
    };

    match embedder.ready().await {
        Ok(()) => CheckResult::ok(
            "Endpoint",
            &format!("{} ({})", settings.embedding.endpoint, settings.embedding.model),
        ),
        Err(e) => CheckResult::error("Endpoint", &e.to_string(), hint),
    }
}

/// Check the vector store directory and collection.
async fn check_store(settings: &Settings) -> CheckResult {
    let dir = settings.store_path();
    let collection = &settings.vector_store.collection;

    match SqliteVectorStore::open(&dir, collection) {
        Ok(store) => {
            let size = store
                .path()
                .and_then(|p| std::fs::metadata(p).ok())
                .map(|m| format_size(m.len()))
                .unwrap_or_else(|| "unknown size".to_string());
            match store.count().await {
                Ok(count) => CheckResult::ok(
                    "Store",
                    &format!("{} samples in '{}' ({})", count, collection, size),
                ),
                Err(e) => CheckResult::error("Store", &e.to_string(), "The store file may be corrupt"),
            }
        }
        Err(e) if e.is_store_unavailable() => CheckResult::warning(
            "Store",
            &format!("{} (not created yet)", dir.display()),
            "Create it with: sampledex index <folder>",
        ),
        Err(e) => CheckResult::error("Store", &e.to_string(), "Check [vector_store] in the config"),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: sampledex config edit",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
