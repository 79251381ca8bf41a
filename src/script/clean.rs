//! TTS text cleanup.
//!
//! Scripts carry stage directions, tone cues and markdown emphasis meant for
//! a human reader. None of it should reach the speech engine.

use regex::Regex;

/// Strips everything from a dialogue line that should not be spoken.
#[derive(Debug)]
pub struct TtsCleaner {
    stage_direction: Regex,
    tone_cue: Regex,
    bold: Regex,
    italic: Regex,
    ellipsis: Regex,
    whitespace_run: Regex,
}

impl TtsCleaner {
    pub fn new() -> Self {
        Self {
            stage_direction: Regex::new(r"\[.*?\]").expect("Invalid regex"),
            tone_cue: Regex::new(r"\(.*?\)").expect("Invalid regex"),
            bold: Regex::new(r"\*\*(.*?)\*\*").expect("Invalid regex"),
            italic: Regex::new(r"\*(.*?)\*").expect("Invalid regex"),
            ellipsis: Regex::new(r"\.\.\.").expect("Invalid regex"),
            whitespace_run: Regex::new(r"\s{2,}").expect("Invalid regex"),
        }
    }

    /// Removes `[...]` stage directions and `(...)` tone cues, keeps the
    /// inner text of `**bold**` and `*italic*` spans, turns ellipses into a
    /// single space and trims the result. Applying it twice yields the same
    /// text.
    pub fn clean(&self, text: &str) -> String {
        let text = self.stage_direction.replace_all(text, "");
        let text = self.tone_cue.replace_all(&text, "");
        let text = self.bold.replace_all(&text, "$1");
        let text = self.italic.replace_all(&text, "$1");
        let text = self.ellipsis.replace_all(&text, " ");
        let text = self.whitespace_run.replace_all(&text, " ");
        text.trim().to_string()
    }
}

impl Default for TtsCleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// One-off cleanup of a single line. Reuse a [`TtsCleaner`] for many lines.
pub fn clean_for_tts(text: &str) -> String {
    TtsCleaner::new().clean(text)
}
