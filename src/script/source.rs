//! Screening of script text handed over by the script generator.
//!
//! The generator reports failures in-band: text starting with `Error:` or
//! `RATE_LIMIT_ERROR::Retry after <N>s::<message>`. Such text must never
//! reach the parser.

use crate::error::{CastlineError, Result};

const ERROR_MARKER: &str = "Error:";
const RATE_LIMIT_MARKER: &str = "RATE_LIMIT_ERROR::";
const DEFAULT_RETRY_SECS: u64 = 60;
const DEFAULT_RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// Classified generator output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource<'a> {
    /// Legitimate script text.
    Script(&'a str),
    /// The generator failed outright.
    Failed(String),
    /// The generator was rate limited.
    RateLimited {
        retry_after_secs: u64,
        message: String,
    },
}

impl<'a> ScriptSource<'a> {
    /// Classify raw generator output.
    pub fn classify(text: &'a str) -> Self {
        if let Some(rest) = text.strip_prefix(RATE_LIMIT_MARKER) {
            let mut parts = rest.split("::");
            let retry_after_secs = parts
                .next()
                .and_then(parse_retry_after)
                .unwrap_or(DEFAULT_RETRY_SECS);
            let message = parts
                .next()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_RATE_LIMIT_MESSAGE)
                .to_string();
            return ScriptSource::RateLimited {
                retry_after_secs,
                message,
            };
        }

        if let Some(rest) = text.strip_prefix(ERROR_MARKER) {
            return ScriptSource::Failed(rest.trim().to_string());
        }

        ScriptSource::Script(text)
    }

    /// Return the script text, or the generator failure as an error.
    pub fn into_script(self) -> Result<&'a str> {
        match self {
            ScriptSource::Script(text) => Ok(text),
            ScriptSource::Failed(message) => Err(CastlineError::ScriptGeneration(message)),
            ScriptSource::RateLimited {
                retry_after_secs,
                message,
            } => Err(CastlineError::RateLimited {
                retry_after_secs,
                message,
            }),
        }
    }
}

/// Parse `Retry after 30s` into seconds.
fn parse_retry_after(part: &str) -> Option<u64> {
    part.trim()
        .trim_start_matches("Retry after")
        .trim()
        .trim_end_matches('s')
        .parse()
        .ok()
}
