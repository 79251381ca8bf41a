//! Transport state machine over the segment list.

use super::{AudioOutput, OutputEvent};
use crate::duration::DurationMap;
use crate::segment::Segment;
use crate::timeline::{format_clock, SeekTarget, Timeline};
use tracing::{debug, info, warn};

/// Selection and transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing(usize),
    Paused(usize),
}

impl PlaybackState {
    pub fn selected(&self) -> Option<usize> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::Playing(i) | PlaybackState::Paused(i) => Some(*i),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing(_))
    }
}

/// Point-in-time view of the transport for display.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub current_time: f64,
    pub overall_duration: f64,
}

impl PlaybackSnapshot {
    /// `MM:SS / MM:SS`
    pub fn clock_label(&self) -> String {
        format!(
            "{} / {}",
            format_clock(self.current_time),
            format_clock(self.overall_duration)
        )
    }
}

/// Drives one [`AudioOutput`] across an ordered list of segments.
pub struct PlaybackController<O: AudioOutput> {
    output: O,
    state: PlaybackState,
    epsilon: f64,
}

impl<O: AudioOutput> PlaybackController<O> {
    /// `epsilon` is how far before a clip's end a past-the-end seek lands.
    pub fn new(output: O, epsilon: f64) -> Self {
        Self {
            output,
            state: PlaybackState::Idle,
            epsilon: epsilon.max(0.0),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Pause when playing, resume when paused, start from the first
    /// playable segment when idle.
    pub fn toggle(&mut self, segments: &mut [Segment], durations: &DurationMap) {
        match self.state {
            PlaybackState::Playing(index) => {
                self.output.pause();
                self.state = PlaybackState::Paused(index);
            }
            PlaybackState::Paused(index) => {
                self.resume(segments, index);
            }
            PlaybackState::Idle => match segments.iter().position(Segment::is_playable) {
                Some(index) => {
                    self.play_segment(segments, durations, index, 0.0);
                }
                None => debug!("Nothing playable yet"),
            },
        }
    }

    /// Load segment `index` into the output and play from `offset`.
    ///
    /// Returns false when the segment cannot be played; the output is then
    /// paused and nothing crashes.
    pub fn play_segment(
        &mut self,
        segments: &mut [Segment],
        durations: &DurationMap,
        index: usize,
        offset: f64,
    ) -> bool {
        let Some(segment) = segments.get_mut(index) else {
            warn!("Segment {} does not exist", index);
            self.halt();
            return false;
        };
        let Some(audio) = segment.audio() else {
            warn!("Segment {} has no playable audio", index);
            self.halt();
            return false;
        };

        if let Err(e) = self.output.load(audio, durations.get(&segment.id)) {
            warn!("Failed to load segment {}: {}", index, e);
            segment.mark_playback_error(&e.to_string());
            self.output.pause();
            self.state = PlaybackState::Paused(index);
            return false;
        }
        self.output.seek(offset.max(0.0));
        self.state = PlaybackState::Paused(index);
        self.resume(segments, index)
    }

    /// Jump to global time `t`.
    ///
    /// In range, playback continues (or starts) at the resolved offset.
    /// Past the end, the last playable segment is cued just before its end
    /// and left paused.
    pub fn seek(&mut self, segments: &mut [Segment], durations: &DurationMap, t: f64) {
        let timeline = Timeline::from_segments(segments, durations);

        match timeline.locate(t, self.epsilon) {
            SeekTarget::Within { index, offset } => {
                if self.state.selected() == Some(index) {
                    self.output.seek(offset);
                    if !self.state.is_playing() {
                        self.resume(segments, index);
                    }
                } else {
                    self.play_segment(segments, durations, index, offset);
                }
            }
            SeekTarget::PastEnd { index, offset } => {
                if self.state.selected() != Some(index) {
                    let Some(segment) = segments.get_mut(index) else {
                        return;
                    };
                    let Some(audio) = segment.audio() else {
                        return;
                    };
                    if let Err(e) = self.output.load(audio, durations.get(&segment.id)) {
                        warn!("Failed to load segment {}: {}", index, e);
                        segment.mark_playback_error(&e.to_string());
                    }
                }
                self.output.seek(offset);
                self.output.pause();
                self.state = PlaybackState::Paused(index);
                debug!("Seek past end, parked at segment {}", index);
            }
            SeekTarget::Empty => {
                debug!("Seek on an empty timeline");
                self.stop();
            }
        }
    }

    /// React to an output notification. Returns the current global time.
    pub fn handle_event(
        &mut self,
        segments: &mut [Segment],
        durations: &DurationMap,
        event: OutputEvent,
    ) -> f64 {
        if event.source() != self.output.source_id() {
            debug!("Ignoring stale output event {:?}", event);
            return self.current_time(segments, durations);
        }

        match (event, self.state) {
            (OutputEvent::Ended { .. }, PlaybackState::Playing(index)) => {
                let next = segments
                    .iter()
                    .enumerate()
                    .skip(index + 1)
                    .find(|(_, s)| s.is_playable())
                    .map(|(i, _)| i);
                match next {
                    Some(next) => {
                        debug!("Advancing from segment {} to {}", index, next);
                        self.play_segment(segments, durations, next, 0.0);
                    }
                    None => {
                        info!("Reached the end of the podcast");
                        self.stop();
                    }
                }
            }
            // Started/Paused can trail the controller's own transitions, so
            // only the output's present state is trusted.
            (OutputEvent::Started { .. }, PlaybackState::Paused(index))
                if self.output.is_playing() =>
            {
                self.state = PlaybackState::Playing(index);
            }
            (OutputEvent::Paused { .. }, PlaybackState::Playing(index))
                if !self.output.is_playing() =>
            {
                self.state = PlaybackState::Paused(index);
            }
            _ => {}
        }

        self.current_time(segments, durations)
    }

    /// Global playhead: durations before the selection plus the output's
    /// local position.
    pub fn current_time(&self, segments: &[Segment], durations: &DurationMap) -> f64 {
        match self.state.selected() {
            Some(index) => Timeline::from_segments(segments, durations)
                .global_time(index, self.output.position()),
            None => 0.0,
        }
    }

    pub fn stop(&mut self) {
        self.output.stop();
        self.state = PlaybackState::Idle;
    }

    pub fn snapshot(&self, segments: &[Segment], durations: &DurationMap) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state,
            current_time: self.current_time(segments, durations),
            overall_duration: durations.total(segments),
        }
    }

    /// Start the output for the selected segment, recording a failure on it.
    fn resume(&mut self, segments: &mut [Segment], index: usize) -> bool {
        match self.output.play() {
            Ok(()) => {
                self.state = PlaybackState::Playing(index);
                true
            }
            Err(e) => {
                warn!("Playback of segment {} failed: {}", index, e);
                if let Some(segment) = segments.get_mut(index) {
                    segment.mark_playback_error(&e.to_string());
                }
                self.output.pause();
                self.state = PlaybackState::Paused(index);
                false
            }
        }
    }

    /// Stop producing sound without giving up the selection.
    fn halt(&mut self) {
        self.output.pause();
        self.state = match self.state {
            PlaybackState::Idle => PlaybackState::Idle,
            PlaybackState::Playing(i) | PlaybackState::Paused(i) => PlaybackState::Paused(i),
        };
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory audio output.

    use super::*;
    use crate::audio::AudioHandle;
    use crate::error::{CastlineError, Result};
    use std::path::PathBuf;

    #[derive(Default)]
    pub struct MockOutput {
        pub source: u64,
        pub loaded: Option<PathBuf>,
        pub position: f64,
        pub playing: bool,
        pub fail_play: bool,
        pub loads: usize,
    }

    impl AudioOutput for MockOutput {
        fn load(&mut self, audio: &AudioHandle, _duration_hint: f64) -> Result<()> {
            self.source += 1;
            self.loads += 1;
            self.loaded = Some(audio.path().to_path_buf());
            self.position = 0.0;
            self.playing = false;
            Ok(())
        }

        fn source_id(&self) -> u64 {
            self.source
        }

        fn seek(&mut self, offset: f64) {
            self.position = offset;
        }

        fn position(&self) -> f64 {
            self.position
        }

        fn play(&mut self) -> Result<()> {
            if self.fail_play {
                return Err(CastlineError::Playback("device unavailable".to_string()));
            }
            self.playing = true;
            Ok(())
        }

        fn is_playing(&self) -> bool {
            self.playing
        }

        fn pause(&mut self) {
            self.playing = false;
        }

        fn stop(&mut self) {
            self.source += 1;
            self.loaded = None;
            self.position = 0.0;
            self.playing = false;
        }
    }
}
