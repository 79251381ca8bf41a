//! Configuration settings for Castline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub tts: TtsSettings,
    pub synthesis: SynthesisSettings,
    pub probe: ProbeSettings,
    pub playback: PlaybackSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory where synthesized clips are materialized.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/castline".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Text-to-speech provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    /// Google Cloud Text-to-Speech (default).
    #[default]
    Google,
    /// OpenAI speech endpoint.
    OpenAi,
}

impl TtsProvider {
    /// Environment variable consulted when no key is configured.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            TtsProvider::Google => "GOOGLE_TTS_API_KEY",
            TtsProvider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl std::str::FromStr for TtsProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" | "gcp" => Ok(TtsProvider::Google),
            "openai" => Ok(TtsProvider::OpenAi),
            _ => Err(format!("Unknown TTS provider: {}", s)),
        }
    }
}

impl std::fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TtsProvider::Google => write!(f, "google"),
            TtsProvider::OpenAi => write!(f, "openai"),
        }
    }
}

/// Text-to-speech service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    /// Provider (google, openai).
    pub provider: TtsProvider,
    /// API key. Falls back to the provider's environment variable.
    pub api_key: Option<String>,
    /// Language code sent with Google requests.
    pub language_code: String,
    /// Google synthesize endpoint.
    pub endpoint: String,
    /// Model used by the OpenAI provider.
    pub openai_model: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            provider: TtsProvider::Google,
            api_key: None,
            language_code: "en-US".to_string(),
            endpoint: "https://texttospeech.googleapis.com/v1/text:synthesize".to_string(),
            openai_model: "tts-1".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl TtsSettings {
    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(self.provider.api_key_env()).ok())
            .filter(|k| !k.is_empty())
    }
}

/// Segment synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisSettings {
    /// Maximum in-flight TTS requests. 1 keeps synthesis strictly sequential.
    pub max_concurrent: usize,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self { max_concurrent: 1 }
    }
}

/// Duration probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Path or name of the ffprobe binary.
    pub ffprobe_path: String,
    /// Per-clip probe timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            ffprobe_path: "ffprobe".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Playback transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Distance from a clip's end used when seeking past the timeline.
    pub seek_epsilon_secs: f64,
    /// Interval between time-update ticks in milliseconds.
    pub tick_millis: u64,
    /// Path or name of the ffplay binary.
    pub ffplay_path: String,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            seek_epsilon_secs: 0.01,
            tick_millis: 250,
            ffplay_path: "ffplay".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::CastlineError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("castline")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Values that parse but cannot work. Empty when the settings are usable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.synthesis.max_concurrent == 0 {
            problems.push("synthesis.max_concurrent must be at least 1".to_string());
        }
        if self.probe.timeout_secs == 0 {
            problems.push("probe.timeout_secs must be at least 1".to_string());
        }
        if self.tts.request_timeout_secs == 0 {
            problems.push("tts.request_timeout_secs must be at least 1".to_string());
        }
        if self.tts.provider == TtsProvider::Google {
            if !self.tts.endpoint.starts_with("http://") && !self.tts.endpoint.starts_with("https://") {
                problems.push(format!("tts.endpoint is not an http(s) URL: {}", self.tts.endpoint));
            }
            if self.tts.language_code.trim().is_empty() {
                problems.push("tts.language_code is empty".to_string());
            }
        }
        if !self.playback.seek_epsilon_secs.is_finite() || self.playback.seek_epsilon_secs < 0.0 {
            problems.push("playback.seek_epsilon_secs must be a non-negative number".to_string());
        }
        if self.playback.tick_millis < 10 {
            problems.push("playback.tick_millis below 10 is raised to 10".to_string());
        }

        problems
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [tts]
            provider = "openai"

            [probe]
            timeout_secs = 2
            "#,
        )
        .unwrap();

        assert_eq!(settings.tts.provider, TtsProvider::OpenAi);
        assert_eq!(settings.tts.language_code, "en-US");
        assert_eq!(settings.probe.timeout_secs, 2);
        assert_eq!(settings.synthesis.max_concurrent, 1);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.playback.tick_millis = 100;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.playback.tick_millis, 100);
    }

    #[test]
    fn test_defaults_validate_cleanly() {
        assert!(Settings::default().validate().is_empty());
    }

    #[test]
    fn test_validate_reports_unusable_values() {
        let mut settings = Settings::default();
        settings.synthesis.max_concurrent = 0;
        settings.probe.timeout_secs = 0;
        settings.tts.endpoint = "texttospeech.local".to_string();
        settings.playback.seek_epsilon_secs = -0.5;

        let problems = settings.validate();
        assert_eq!(problems.len(), 4);
        assert!(problems.iter().any(|p| p.starts_with("synthesis.max_concurrent")));
        assert!(problems.iter().any(|p| p.starts_with("tts.endpoint")));
    }

    #[test]
    fn test_openai_ignores_google_endpoint() {
        let mut settings = Settings::default();
        settings.tts.provider = TtsProvider::OpenAi;
        settings.tts.endpoint = String::new();
        assert!(settings.validate().is_empty());
    }

    #[test]
    fn test_general_section_keys() {
        let settings = Settings::default();
        let content = toml::to_string_pretty(&settings).unwrap();
        let table: toml::Table = content.parse().unwrap();
        let general = table["general"].as_table().unwrap();

        let mut keys: Vec<&str> = general.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["log_level", "temp_dir"]);
        assert_eq!(settings.temp_dir(), PathBuf::from("/tmp/castline"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = PathBuf::from("/nonexistent/castline/config.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.probe.ffprobe_path, "ffprobe");
    }

    #[test]
    fn test_configured_key_wins() {
        let tts = TtsSettings {
            api_key: Some("configured-key".to_string()),
            ..Default::default()
        };
        assert_eq!(tts.resolve_api_key().as_deref(), Some("configured-key"));
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("Google".parse::<TtsProvider>(), Ok(TtsProvider::Google));
        assert_eq!("openai".parse::<TtsProvider>(), Ok(TtsProvider::OpenAi));
        assert!("polly".parse::<TtsProvider>().is_err());
    }
}
