//! OpenAI speech endpoint implementation.

use super::{SpeechSynthesizer, MIN_API_KEY_LEN};
use crate::audio::AudioHandle;
use crate::config::Settings;
use crate::error::{CastlineError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI-based speech synthesizer.
pub struct OpenAiTts {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    has_key: bool,
    clip_dir: PathBuf,
}

impl OpenAiTts {
    /// Create a synthesizer from application settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_config(
            &settings.tts.openai_model,
            settings.tts.resolve_api_key(),
            settings.temp_dir(),
            Duration::from_secs(settings.tts.request_timeout_secs),
        )
    }

    /// Create a synthesizer with explicit configuration.
    pub fn with_config(
        model: &str,
        api_key: Option<String>,
        clip_dir: PathBuf,
        timeout: Duration,
    ) -> Result<Self> {
        let has_key = api_key.as_ref().is_some_and(|k| k.len() >= MIN_API_KEY_LEN);
        let client = create_client_with_timeout(api_key.as_deref(), timeout)?;

        Ok(Self {
            client,
            model: model.to_string(),
            has_key,
            clip_dir,
        })
    }

    fn speech_model(&self) -> SpeechModel {
        match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        }
    }
}

fn parse_voice(voice: &str) -> Result<Voice> {
    match voice.to_lowercase().as_str() {
        "alloy" => Ok(Voice::Alloy),
        "echo" => Ok(Voice::Echo),
        "fable" => Ok(Voice::Fable),
        "onyx" => Ok(Voice::Onyx),
        "nova" => Ok(Voice::Nova),
        "shimmer" => Ok(Voice::Shimmer),
        "" => Err(CastlineError::Tts(
            "Voice name must be provided for audio generation.".to_string(),
        )),
        other => Err(CastlineError::Tts(format!("Unsupported OpenAI voice: {}", other))),
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiTts {
    #[instrument(skip(self, text), fields(chars = text.len(), model = %self.model))]
    async fn synthesize(&self, text: &str, voice: &str) -> Result<AudioHandle> {
        if !self.has_key {
            return Err(CastlineError::Credentials(
                "OpenAI API key is not properly configured.".to_string(),
            ));
        }
        if text.trim().is_empty() {
            return Err(CastlineError::Tts(
                "Cannot generate audio from empty text.".to_string(),
            ));
        }
        let voice = parse_voice(voice)?;

        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .voice(voice)
            .model(self.speech_model())
            .response_format(SpeechResponseFormat::Mp3)
            .build()
            .map_err(|e| CastlineError::Tts(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .speech(request)
            .await
            .map_err(|e| CastlineError::OpenAI(format!("Speech API error: {}", e)))?;

        if response.bytes.is_empty() {
            return Err(CastlineError::Tts(
                "OpenAI speech API returned an empty audio file.".to_string(),
            ));
        }

        debug!("Received {} bytes of audio", response.bytes.len());
        AudioHandle::from_bytes(&response.bytes, "audio/mpeg", &self.clip_dir)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tts(key: Option<&str>) -> OpenAiTts {
        OpenAiTts::with_config(
            "tts-1",
            key.map(str::to_string),
            std::env::temp_dir(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_voice_names() {
        assert!(matches!(parse_voice("Nova"), Ok(Voice::Nova)));
        assert!(matches!(parse_voice("onyx"), Ok(Voice::Onyx)));
        assert!(parse_voice("").is_err());
        assert!(parse_voice("en-US-Chirp3-HD-Autonoe").is_err());
    }

    #[test]
    fn test_model_mapping() {
        assert!(matches!(tts(None).speech_model(), SpeechModel::Tts1));
        let custom = OpenAiTts::with_config("gpt-4o-mini-tts", None, std::env::temp_dir(), Duration::from_secs(5)).unwrap();
        assert!(matches!(custom.speech_model(), SpeechModel::Other(m) if m == "gpt-4o-mini-tts"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let err = tts(None).synthesize("Hello", "nova").await.unwrap_err();
        assert!(matches!(err, CastlineError::Credentials(_)));
    }

    #[tokio::test]
    async fn test_empty_text_fails_before_request() {
        let err = tts(Some("sk-0123456789abcdefghijkl"))
            .synthesize("  ", "nova")
            .await
            .unwrap_err();
        assert!(matches!(err, CastlineError::Tts(_)));
    }
}
