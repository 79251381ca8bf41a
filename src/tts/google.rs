//! Google Cloud Text-to-Speech implementation.

use super::{SpeechSynthesizer, MIN_API_KEY_LEN};
use crate::audio::AudioHandle;
use crate::config::Settings;
use crate::error::{CastlineError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: TextInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct TextInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    effects_profile_id: [&'static str; 1],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Google Cloud TTS client using the REST `text:synthesize` endpoint.
pub struct GoogleTts {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    language_code: String,
    clip_dir: PathBuf,
}

impl GoogleTts {
    /// Create a client from application settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_config(
            &settings.tts.endpoint,
            settings.tts.resolve_api_key(),
            &settings.tts.language_code,
            settings.temp_dir(),
            Duration::from_secs(settings.tts.request_timeout_secs),
        )
    }

    /// Create a client with explicit configuration.
    pub fn with_config(
        endpoint: &str,
        api_key: Option<String>,
        language_code: &str,
        clip_dir: PathBuf,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
            language_code: language_code.to_string(),
            clip_dir,
        })
    }

    fn api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if key.len() >= MIN_API_KEY_LEN => Ok(key),
            _ => Err(CastlineError::Credentials(
                "Google Cloud TTS API key is not properly configured.".to_string(),
            )),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn synthesize(&self, text: &str, voice: &str) -> Result<AudioHandle> {
        let key = self.api_key()?;
        if text.trim().is_empty() {
            return Err(CastlineError::Tts(
                "Cannot generate audio from empty text.".to_string(),
            ));
        }
        if voice.is_empty() {
            return Err(CastlineError::Tts(
                "Voice name must be provided for audio generation.".to_string(),
            ));
        }

        let body = SynthesizeRequest {
            input: TextInput { text },
            voice: VoiceSelection {
                language_code: &self.language_code,
                name: voice,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                effects_profile_id: ["headphone-class-device"],
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&raw)
                .ok()
                .and_then(|e| e.error)
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
            return Err(CastlineError::Tts(format!(
                "Google Cloud TTS API request failed: {}",
                message
            )));
        }

        let payload: SynthesizeResponse = response.json().await?;
        let encoded = payload
            .audio_content
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                CastlineError::Tts(
                    "Google Cloud TTS API returned no audio content. The input text might be too short or contain only unsupported characters.".to_string(),
                )
            })?;

        let bytes = STANDARD.decode(encoded)?;
        if bytes.is_empty() {
            return Err(CastlineError::Tts(
                "Google Cloud TTS API resulted in an empty audio file after decoding.".to_string(),
            ));
        }

        debug!("Decoded {} bytes of audio", bytes.len());
        AudioHandle::from_bytes(&bytes, "audio/mpeg", &self.clip_dir)
    }

    fn name(&self) -> &str {
        "google"
    }
}
