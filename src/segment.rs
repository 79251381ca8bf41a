//! Podcast segments: one spoken line plus its synthesized audio.

use crate::audio::AudioHandle;
use crate::script::{ParsedLine, Speaker};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a segment within one script-to-audio run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId(Uuid);

impl SegmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "seg-{}", self.0.simple())
    }
}

/// A speaker-attributed line and its synthesis state.
#[derive(Debug)]
pub struct Segment {
    pub id: SegmentId,
    pub speaker: Speaker,
    /// The source line, kept for display.
    pub raw_text: String,
    /// Speakable text. Empty for cues.
    pub cleaned_text: String,
    audio: Option<AudioHandle>,
    loading: bool,
    error: Option<String>,
}

impl Segment {
    /// Create a pending segment from a parsed script line.
    pub fn from_parsed(line: ParsedLine) -> Self {
        Self {
            id: SegmentId::new(),
            speaker: line.speaker,
            raw_text: line.raw_text,
            cleaned_text: line.cleaned_text,
            audio: None,
            loading: false,
            error: None,
        }
    }

    /// A cue has nothing to say and is never synthesized.
    pub fn is_cue(&self) -> bool {
        self.cleaned_text.is_empty()
    }

    pub fn audio(&self) -> Option<&AudioHandle> {
        self.audio.as_ref()
    }

    pub fn is_playable(&self) -> bool {
        self.audio.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Synthesis finished one way or another, or was never needed.
    pub fn is_settled(&self) -> bool {
        !self.loading && (self.audio.is_some() || self.error.is_some() || self.is_cue())
    }

    pub(crate) fn mark_loading(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Take ownership of a freshly synthesized clip, releasing any previous one.
    pub(crate) fn attach_audio(&mut self, audio: AudioHandle) {
        self.release_audio();
        self.audio = Some(audio);
        self.loading = false;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    pub(crate) fn mark_playback_error(&mut self, message: &str) {
        self.loading = false;
        self.error = Some(format!("Playback error: {}", message));
    }

    /// Delete the segment's clip, if any.
    pub fn release_audio(&mut self) {
        if let Some(audio) = self.audio.take() {
            audio.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> ParsedLine {
        ParsedLine {
            speaker: Speaker::Guest,
            raw_text: format!("Guest: {}", text),
            cleaned_text: text.to_string(),
        }
    }

    #[test]
    fn test_state_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let mut segment = Segment::from_parsed(line("Hi!"));
        assert!(!segment.is_settled());

        segment.mark_loading();
        assert!(segment.is_loading());
        assert!(!segment.is_settled());

        segment.attach_audio(AudioHandle::from_bytes(b"x", "audio/mpeg", dir.path()).unwrap());
        assert!(segment.is_playable());
        assert!(segment.is_settled());
        assert!(!segment.is_loading());
    }

    #[test]
    fn test_failure_settles_without_audio() {
        let mut segment = Segment::from_parsed(line("Hi!"));
        segment.mark_loading();
        segment.fail("quota");

        assert!(segment.is_settled());
        assert!(!segment.is_playable());
        assert_eq!(segment.error(), Some("quota"));
    }

    #[test]
    fn test_cue_is_settled_immediately() {
        let segment = Segment::from_parsed(line(""));
        assert!(segment.is_cue());
        assert!(segment.is_settled());
        assert!(!segment.is_playable());
    }

    #[test]
    fn test_attach_releases_previous_clip() {
        let dir = tempfile::tempdir().unwrap();
        let mut segment = Segment::from_parsed(line("Hi!"));

        segment.attach_audio(AudioHandle::from_bytes(b"a", "audio/mpeg", dir.path()).unwrap());
        let first = segment.audio().unwrap().path().to_path_buf();

        segment.attach_audio(AudioHandle::from_bytes(b"b", "audio/mpeg", dir.path()).unwrap());
        assert!(!first.exists());
        assert!(segment.audio().unwrap().path().exists());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(SegmentId::new(), SegmentId::new());
        assert!(SegmentId::new().to_string().starts_with("seg-"));
    }
}
