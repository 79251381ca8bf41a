//! Line-oriented parser for two-speaker podcast scripts.

use super::clean::TtsCleaner;
use super::{ParsedLine, Speaker};
use crate::error::{CastlineError, Result};
use regex::Regex;
use tracing::{debug, instrument, warn};

/// Line parser with its patterns compiled once.
#[derive(Debug)]
pub struct ScriptParser {
    /// `Host: text`, `**Guest:** text`, `*Host*: text`.
    inline_speaker: Regex,
    /// A line holding only `Host` or `**Guest**`.
    standalone_speaker: Regex,
    /// Chatty lead-ins the model tends to put before the script.
    preamble: Regex,
    leading_label: Regex,
    bare_speaker: Regex,
    cleaner: TtsCleaner,
}

impl ScriptParser {
    pub fn new() -> Self {
        Self {
            inline_speaker: Regex::new(
                r"(?i)^\s*(?:\*\*|\*)?(host|guest)(?:\*\*|\*)?\s*:\s*(.*)$",
            )
            .expect("Invalid regex"),
            standalone_speaker: Regex::new(r"(?i)^\s*(?:\*\*|\*)?(host|guest)(?:\*\*|\*)?\s*$")
                .expect("Invalid regex"),
            preamble: Regex::new(
                r"(?i)^(okay, here is a podcast script|here's the script:|here is the podcast script:|here is the script:)",
            )
            .expect("Invalid regex"),
            leading_label: Regex::new(r"(?i)^\s*(host|guest)\s*:\s*").expect("Invalid regex"),
            bare_speaker: Regex::new(r"(?i)^\s*(host|guest)\s*$").expect("Invalid regex"),
            cleaner: TtsCleaner::new(),
        }
    }

    /// Parse a raw script into speaker-attributed lines, in input order.
    ///
    /// Lines that cannot be attributed to a speaker are skipped with a
    /// warning. An empty result is not an error here; see
    /// [`ScriptParser::parse_checked`].
    #[instrument(skip(self, script), fields(bytes = script.len()))]
    pub fn parse(&self, script: &str) -> Vec<ParsedLine> {
        let mut lines = Vec::new();
        let mut pending: Option<Speaker> = None;

        for original in script.lines() {
            let trimmed = original.trim();
            if trimmed.is_empty() || self.preamble.is_match(trimmed) {
                continue;
            }

            let (speaker, dialogue) = if let Some(caps) = self.inline_speaker.captures(trimmed) {
                pending = None;
                let speaker = speaker_from_label(&caps[1]);
                let dialogue = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
                (speaker, dialogue)
            } else if let Some(caps) = self.standalone_speaker.captures(trimmed) {
                // Last marker wins when two arrive back to back.
                pending = Some(speaker_from_label(&caps[1]));
                continue;
            } else if let Some(speaker) = pending.take() {
                (speaker, trimmed)
            } else {
                warn!("Skipping unparseable podcast line: {}", original);
                continue;
            };

            let cleaned = self.cleaner.clean(dialogue);
            let cleaned = self.leading_label.replace(&cleaned, "").trim().to_string();

            if self.bare_speaker.is_match(&cleaned.replace(['*', '_'], "")) {
                debug!("Dropping bare speaker remainder: {}", original);
                continue;
            }

            lines.push(ParsedLine {
                speaker,
                raw_text: original.to_string(),
                cleaned_text: cleaned,
            });
        }

        debug!("Parsed {} script lines", lines.len());
        lines
    }

    /// Parse a script and fail if nothing usable came out of it.
    pub fn parse_checked(&self, script: &str) -> Result<Vec<ParsedLine>> {
        let lines = self.parse(script);
        if lines.is_empty() {
            return Err(CastlineError::UnparseableScript);
        }
        Ok(lines)
    }
}

impl Default for ScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse with a throwaway [`ScriptParser`].
pub fn parse_script(script: &str) -> Vec<ParsedLine> {
    ScriptParser::new().parse(script)
}

/// Checked parse with a throwaway [`ScriptParser`].
pub fn parse_script_checked(script: &str) -> Result<Vec<ParsedLine>> {
    ScriptParser::new().parse_checked(script)
}

fn speaker_from_label(label: &str) -> Speaker {
    if label.eq_ignore_ascii_case("guest") {
        Speaker::Guest
    } else {
        Speaker::Host
    }
}
