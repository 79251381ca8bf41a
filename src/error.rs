//! Error types for Castline.

use thiserror::Error;

/// Library-level error type for Castline operations.
#[derive(Error, Debug)]
pub enum CastlineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Script generation failed: {0}")]
    ScriptGeneration(String),

    #[error("Rate limited: {message} (retry after {retry_after_secs}s)")]
    RateLimited {
        retry_after_secs: u64,
        message: String,
    },

    #[error("Script is empty or unparseable. Ensure it only contains Host and Guest lines.")]
    UnparseableScript,

    #[error("Speech synthesis failed: {0}")]
    Tts(String),

    #[error("TTS credentials missing or invalid: {0}")]
    Credentials(String),

    #[error("Duration probe failed: {0}")]
    Probe(String),

    #[error("Duration probe timed out after {0}s")]
    ProbeTimeout(u64),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Synthesis is still in flight")]
    SynthesisInFlight,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),
}

/// Result type alias for Castline operations.
pub type Result<T> = std::result::Result<T, CastlineError>;
