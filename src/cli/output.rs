//! CLI output formatting utilities.

use crate::playback::{PlaybackSnapshot, PlaybackState};
use crate::segment::Segment;
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

    /// Print one transcript line with its synthesis state.
    pub fn segment(index: usize, segment: &Segment, duration: f64, current: bool) {
        let marker = if current {
            style(">").green().bold()
        } else {
            style(" ").dim()
        };
        let speaker = format!("{:<5}", segment.speaker.to_string());
        let speaker = match segment.speaker {
            crate::script::Speaker::Host => style(speaker).cyan().bold(),
            crate::script::Speaker::Guest => style(speaker).magenta().bold(),
        };

        let text = if segment.is_cue() {
            style(format!("({})", segment.raw_text.trim())).dim().italic().to_string()
        } else {
            content_preview(&segment.cleaned_text, 100)
        };

        let status = match segment.error() {
            Some(error) => style(error.to_string()).red().to_string(),
            None if segment.is_loading() => style("synthesizing...").yellow().to_string(),
            None if segment.is_playable() => style(format_duration(duration)).dim().to_string(),
            None => String::new(),
        };

        println!("{} {:>3} {} {} {}", marker, index + 1, speaker, text, status);
    }

    /// Render the transport line.
    pub fn transport(snapshot: &PlaybackSnapshot) -> String {
        let state = match snapshot.state {
            PlaybackState::Idle => style("stopped".to_string()).dim(),
            PlaybackState::Playing(i) => style(format!("playing #{}", i + 1)).green(),
            PlaybackState::Paused(i) => style(format!("paused #{}", i + 1)).yellow(),
        };
        format!("{} {}", style(snapshot.clock_label()).bold(), state)
    }

    /// Create a progress bar.
    pub fn progress_bar(len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
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

/// Format duration in seconds to a human-readable string.
fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let minutes = total_seconds / 60;
    let secs = total_seconds % 60;

    if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{:.1}s", seconds.max(0.0))
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_len: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_len {
        content
    } else {
        let cut: String = content.chars().take(max_len).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(2.4), "2.4s");
        assert_eq!(format_duration(61.0), "1m 1s");
    }

    #[test]
    fn test_content_preview_is_char_safe() {
        assert_eq!(content_preview("héllo wörld", 5), "héllo...");
        assert_eq!(content_preview("short", 10), "short");
    }
}
