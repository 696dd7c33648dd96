//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{Context, Result};
use std::path::Path;

/// Run the config command against the config file in effect.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str =
                toml::to_string_pretty(&settings).context("Failed to serialize config")?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Edit => {
            if write_if_missing(&settings, config_path)? {
                Output::info(&format!("Created config at {}", config_path.display()));
            }
            open_in_editor(config_path);
        }
    }

    Ok(())
}

/// Write `settings` to `path` unless a file is already there.
///
/// Returns whether a file was created.
fn write_if_missing(settings: &Settings, path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    settings.save_to(&path.to_path_buf())?;
    Ok(true)
}

fn open_in_editor(path: &Path) {
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());
    Output::info(&format!("Opening {} in {}...", path.display(), editor));

    match std::process::Command::new(&editor).arg(path).status() {
        Ok(status) if status.success() => Output::success("Config saved."),
        Ok(_) => Output::warning("Editor exited with non-zero status."),
        Err(e) => {
            Output::error(&format!("Failed to open editor: {}", e));
            Output::info(&format!("Config file is at: {}", path.display()));
        }
    }
}
