//! Timeline playback.
//!
//! One shared [`AudioOutput`] plays one segment at a time. The
//! [`PlaybackController`] maps transport actions on the global timeline
//! (toggle, seek, jump to segment) onto that output and auto-advances past
//! cues and failed segments when a clip ends.
//!
//! The controller never holds the segment list itself: callers pass the
//! current segments and duration cache into every operation.

mod clock;
mod controller;
mod ffplay;

pub use clock::ClockOutput;
pub use controller::{PlaybackController, PlaybackSnapshot, PlaybackState};
pub use ffplay::FfplaySink;

use crate::audio::AudioHandle;
use crate::error::Result;

/// Notifications from an audio output.
///
/// Each event names the load it belongs to; events from an earlier load
/// are stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputEvent {
    /// The local position advanced.
    TimeUpdate { source: u64, position: f64 },
    /// The loaded clip played to its end.
    Ended { source: u64 },
    Started { source: u64 },
    Paused { source: u64 },
}

impl OutputEvent {
    pub fn source(&self) -> u64 {
        match self {
            OutputEvent::TimeUpdate { source, .. }
            | OutputEvent::Ended { source }
            | OutputEvent::Started { source }
            | OutputEvent::Paused { source } => *source,
        }
    }
}

/// A single controllable playback primitive.
pub trait AudioOutput: Send {
    /// Replace the current source. Playback is paused at offset 0 afterwards.
    fn load(&mut self, audio: &AudioHandle, duration_hint: f64) -> Result<()>;

    /// Identifier of the current load, matched against [`OutputEvent::source`].
    fn source_id(&self) -> u64;

    /// Move to `offset` seconds into the current source.
    fn seek(&mut self, offset: f64);

    /// Local position in the current source, in seconds.
    fn position(&self) -> f64;

    fn play(&mut self) -> Result<()>;

    /// Whether the output is producing sound right now.
    fn is_playing(&self) -> bool;

    fn pause(&mut self);

    /// Pause and unload the current source.
    fn stop(&mut self);
}
