//! Podcast session state.
//!
//! A [`PodcastSession`] owns everything one script slot produces: the
//! segment list, their clips, the duration cache and the banner shown when
//! something went wrong. Every (re)load starts a new run; synthesis events
//! from earlier runs are discarded on arrival.

use crate::duration::DurationMap;
use crate::error::{CastlineError, Result};
use crate::script::{ScriptParser, ScriptSource};
use crate::segment::{Segment, SegmentId};
use crate::synthesis::{RunId, SynthesisEvent, SynthesisJob, SynthesisRequest};
use tracing::{debug, info, warn};

/// Banner shown when at least one segment failed to synthesize.
pub const SEGMENTS_FAILED_BANNER: &str = "One or more audio segments failed.";

#[derive(Debug, Default)]
pub struct PodcastSession {
    run: RunId,
    segments: Vec<Segment>,
    durations: DurationMap,
    banner: Option<String>,
    parser: ScriptParser,
}

impl PodcastSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session contents with a freshly parsed script.
    ///
    /// Clips from the previous run are released first. Returns the synthesis
    /// work for the new run; cues produce no request.
    pub fn load_script(&mut self, script: &str) -> Result<SynthesisJob> {
        self.reset();

        let text = match ScriptSource::classify(script).into_script() {
            Ok(text) => text,
            Err(e) => {
                self.banner = Some(e.to_string());
                return Err(e);
            }
        };

        let lines = match self.parser.parse_checked(text) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Script produced no segments");
                self.banner = Some(e.to_string());
                return Err(e);
            }
        };

        self.segments = lines.into_iter().map(Segment::from_parsed).collect();
        let requests = self
            .segments
            .iter()
            .filter(|s| !s.is_cue())
            .map(|s| SynthesisRequest {
                segment_id: s.id,
                speaker: s.speaker,
                text: s.cleaned_text.clone(),
            })
            .collect::<Vec<_>>();

        info!(
            "Loaded {} segments ({} to synthesize) for {}",
            self.segments.len(),
            requests.len(),
            self.run
        );

        Ok(SynthesisJob {
            run: self.run,
            requests,
        })
    }

    /// Apply a synthesis event. Returns false when the event was stale.
    pub fn apply(&mut self, event: SynthesisEvent) -> bool {
        if event.run() != self.run {
            debug!("Discarding event from {} (current {})", event.run(), self.run);
            if let SynthesisEvent::Finished {
                outcome: Ok(audio), ..
            } = event
            {
                audio.release();
            }
            return false;
        }

        match event {
            SynthesisEvent::Started { segment_id, .. } => {
                if let Some(segment) = self.segment_mut(segment_id) {
                    segment.mark_loading();
                }
            }
            SynthesisEvent::Finished {
                segment_id,
                outcome,
                ..
            } => match (self.segment_mut(segment_id), outcome) {
                (Some(segment), Ok(audio)) => segment.attach_audio(audio),
                (Some(segment), Err(message)) => segment.fail(message),
                (None, Ok(audio)) => audio.release(),
                (None, Err(_)) => {}
            },
            SynthesisEvent::Settled { report, .. } => {
                if report.has_failures() {
                    self.banner = Some(SEGMENTS_FAILED_BANNER.to_string());
                }
            }
        }
        true
    }

    /// Release every clip, forget durations and start a new run.
    pub fn reset(&mut self) {
        for segment in &mut self.segments {
            segment.release_audio();
        }
        self.segments.clear();
        self.durations.clear();
        self.banner = None;
        self.run = self.run.next();
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn durations(&self) -> &DurationMap {
        &self.durations
    }

    /// Segments and durations together, for the playback controller.
    pub fn playback_parts(&mut self) -> (&mut [Segment], &DurationMap) {
        (self.segments.as_mut_slice(), &self.durations)
    }

    /// Segments and the mutable duration cache, for the resolver.
    pub fn resolve_parts(&mut self) -> (&[Segment], &mut DurationMap) {
        (self.segments.as_slice(), &mut self.durations)
    }

    /// Whether every segment has finished synthesizing.
    pub fn is_settled(&self) -> bool {
        self.segments.iter().all(Segment::is_settled)
    }

    pub fn failed_count(&self) -> usize {
        self.segments.iter().filter(|s| s.error().is_some()).count()
    }

    pub fn overall_duration(&self) -> f64 {
        self.durations.total(&self.segments)
    }

    fn segment_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| s.id == id)
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Error to return when the session holds no segments.
    pub fn ensure_loaded(&self) -> Result<()> {
        if self.segments.is_empty() {
            return Err(CastlineError::UnparseableScript);
        }
        Ok(())
    }
}

impl Drop for PodcastSession {
    fn drop(&mut self) {
        for segment in &mut self.segments {
            segment.release_audio();
        }
    }
}
