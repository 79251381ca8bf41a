//! Text-to-speech collaborators.
//!
//! Each provider turns one line of cleaned dialogue into a playable
//! [`AudioHandle`]. Which voice speaks a line is a fixed per-provider lookup.

mod google;
mod openai;

pub use google::GoogleTts;
pub use openai::OpenAiTts;

use crate::audio::AudioHandle;
use crate::config::{Settings, TtsProvider};
use crate::error::Result;
use crate::script::Speaker;
use async_trait::async_trait;
use std::sync::Arc;

/// Minimum plausible API key length.
pub(crate) const MIN_API_KEY_LEN: usize = 20;

/// Trait for speech synthesis services.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with the given voice into a playable clip.
    async fn synthesize(&self, text: &str, voice: &str) -> Result<AudioHandle>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// Static speaker-to-voice assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceMap {
    pub host: &'static str,
    pub guest: &'static str,
}

impl VoiceMap {
    pub const GOOGLE: VoiceMap = VoiceMap {
        host: "en-US-Chirp3-HD-Autonoe",
        guest: "en-US-Chirp3-HD-Schedar",
    };

    pub const OPENAI: VoiceMap = VoiceMap {
        host: "nova",
        guest: "onyx",
    };

    pub fn for_provider(provider: TtsProvider) -> Self {
        match provider {
            TtsProvider::Google => Self::GOOGLE,
            TtsProvider::OpenAi => Self::OPENAI,
        }
    }

    pub fn voice_for(&self, speaker: Speaker) -> &'static str {
        match speaker {
            Speaker::Host => self.host,
            Speaker::Guest => self.guest,
        }
    }
}

/// Create the configured speech synthesizer.
pub fn create_synthesizer(settings: &Settings) -> Result<Arc<dyn SpeechSynthesizer>> {
    let synthesizer: Arc<dyn SpeechSynthesizer> = match settings.tts.provider {
        TtsProvider::Google => Arc::new(GoogleTts::new(settings)?),
        TtsProvider::OpenAi => Arc::new(OpenAiTts::new(settings)?),
    };
    Ok(synthesizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_lookup_is_per_speaker() {
        let voices = VoiceMap::for_provider(TtsProvider::Google);
        assert_eq!(voices.voice_for(Speaker::Host), "en-US-Chirp3-HD-Autonoe");
        assert_eq!(voices.voice_for(Speaker::Guest), "en-US-Chirp3-HD-Schedar");

        let voices = VoiceMap::for_provider(TtsProvider::OpenAi);
        assert_ne!(voices.voice_for(Speaker::Host), voices.voice_for(Speaker::Guest));
    }

    #[test]
    fn test_factory_follows_provider() {
        let mut settings = Settings::default();
        settings.tts.api_key = Some("k".repeat(MIN_API_KEY_LEN));

        let google = create_synthesizer(&settings).unwrap();
        assert_eq!(google.name(), "google");

        settings.tts.provider = TtsProvider::OpenAi;
        let openai = create_synthesizer(&settings).unwrap();
        assert_eq!(openai.name(), "openai");
    }
}
