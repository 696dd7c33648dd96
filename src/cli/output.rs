//! CLI output formatting utilities.

use crate::search::SearchHit;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print an indexed sample.
    pub fn sample_info(filename: Option<&str>, route: &str, duration: Option<f64>) {
        let duration_str = duration
            .map(format_duration)
            .unwrap_or_else(|| "?".to_string());
        println!(
            "  {} {} ({}) {}",
            style("*").cyan(),
            style(filename.unwrap_or("<unnamed>")).bold(),
            duration_str,
            style(route).dim()
        );
    }

    /// Print a ranked search result.
    pub fn search_result(rank: usize, hit: &SearchHit) {
        println!(
            "#{} | {}",
            rank,
            style(hit.filename.as_deref().unwrap_or("<unnamed>")).bold()
        );
        println!(
            "    {} Score: {:.4} | Route: {}",
            style("└").dim(),
            hit.score,
            style(&hit.route).dim()
        );
    }

    /// Create a percentage progress bar.
    pub fn percent_bar(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(msg.to_string());
        pb
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format duration in seconds to a short human-readable string.
fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let total = seconds as u32;
        format!("{}m {}s", total / 60, total % 60)
    }
}
