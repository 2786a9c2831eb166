// ============================================================================
// tvstream-cli/src/terminal.rs
// ============================================================================
//
// TERMINAL OUTPUT: Sections, Status Lines and the Streaming Spinner
//
// Everything here writes to stderr. Stdout carries compiled arguments or the
// channel's byte stream and must not be mixed with UI text.
//
// KEY COMPONENTS:
// - styling: symbols, prefixes and indentation
// - print_section / print_status / print_success / print_error
// - StreamProgress: indicatif spinner showing bytes delivered
//
// AI-ASSISTANT-INFO: Terminal UI components and styling for the CLI

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Styling constants for terminal output
pub mod styling {
    pub const SUCCESS_SYMBOL: &str = "✓";
    pub const ERROR_SYMBOL: &str = "✗";

    pub const SECTION_PREFIX: &str = "===== ";
    pub const SECTION_SUFFIX: &str = " =====";

    pub const STATUS_INDENT: &str = "  ";
    pub const LABEL_WIDTH: usize = 15;
}

static USE_COLOR: AtomicBool = AtomicBool::new(true);

/// Enables or disables colored output.
pub fn set_color(enabled: bool) {
    USE_COLOR.store(enabled, Ordering::Relaxed);
}

pub fn should_use_color() -> bool {
    USE_COLOR.load(Ordering::Relaxed)
}

pub fn format_section(title: &str) -> String {
    let title = title.to_uppercase();
    if should_use_color() {
        format!("{}{}{}", styling::SECTION_PREFIX, title.cyan().bold(), styling::SECTION_SUFFIX)
    } else {
        format!("{}{}{}", styling::SECTION_PREFIX, title, styling::SECTION_SUFFIX)
    }
}

pub fn format_status(label: &str, value: &str, highlight: bool) -> String {
    let padding = styling::LABEL_WIDTH.saturating_sub(label.len()).max(1);
    let value = if should_use_color() && highlight {
        value.bold().to_string()
    } else {
        value.to_string()
    };
    format!("{}{}:{}{}", styling::STATUS_INDENT, label, " ".repeat(padding), value)
}

pub fn print_section(title: &str) {
    eprintln!();
    eprintln!("{}", format_section(title));
}

pub fn print_status(label: &str, value: &str, highlight: bool) {
    eprintln!("{}", format_status(label, value, highlight));
}

pub fn print_success(message: &str) {
    eprintln!("{}{} {}", styling::STATUS_INDENT, styling::SUCCESS_SYMBOL, message);
}

/// Prints an error block. Always shown.
pub fn print_error(title: &str, message: &str, suggestion: Option<&str>) {
    if should_use_color() {
        eprintln!("{} {}", styling::ERROR_SYMBOL, title.red().bold());
    } else {
        eprintln!("{} {}", styling::ERROR_SYMBOL, title);
    }
    eprintln!();
    eprintln!("  Message:  {message}");
    if let Some(suggestion) = suggestion {
        eprintln!();
        eprintln!("  Suggestion: {suggestion}");
    }
}

/// Spinner for a running channel session.
///
/// Hidden automatically when stderr is not a terminal.
pub struct StreamProgress {
    bar: ProgressBar,
    channel: String,
}

impl StreamProgress {
    pub fn new(channel: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        Self {
            bar,
            channel: channel.to_string(),
        }
    }

    pub fn update(&self, state: &str, bytes: u64) {
        self.bar
            .set_message(format!("channel {} {}: {} streamed", self.channel, state, HumanBytes(bytes)));
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_formatting() {
        set_color(false);
        assert_eq!(format_section("Pipeline"), "===== PIPELINE =====");
        assert_eq!(format_status("Encoder", "libx264", true), "  Encoder:        libx264");
        // Long labels keep one space
        assert_eq!(
            format_status("Hardware acceleration", "nvenc", false),
            "  Hardware acceleration: nvenc"
        );
    }
}
