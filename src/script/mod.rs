//! Podcast script handling.
//!
//! Turns loosely structured two-speaker dialogue produced by a language model
//! into ordered, speaker-tagged lines ready for speech synthesis.

mod clean;
mod parser;
mod source;

pub use clean::{clean_for_tts, TtsCleaner};
pub use parser::{parse_script, parse_script_checked, ScriptParser};
pub use source::ScriptSource;

use serde::{Deserialize, Serialize};

/// One of the two voices in a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Host,
    Guest,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Speaker::Host => write!(f, "Host"),
            Speaker::Guest => write!(f, "Guest"),
        }
    }
}

/// A script line attributed to a speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLine {
    pub speaker: Speaker,
    /// The source line as it appeared in the script.
    pub raw_text: String,
    /// Speakable text. Empty for cues.
    pub cleaned_text: String,
}

impl ParsedLine {
    /// A cue has no spoken content and is never synthesized.
    pub fn is_cue(&self) -> bool {
        self.cleaned_text.is_empty()
    }
}
