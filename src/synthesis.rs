//! Segment synthesis.
//!
//! Drives the TTS collaborator over every speakable segment of a run and
//! reports each outcome as an event tagged with the run it belongs to.
//! A failed segment never stops the rest of the run.

use crate::audio::AudioHandle;
use crate::error::Result;
use crate::script::Speaker;
use crate::segment::SegmentId;
use crate::tts::{SpeechSynthesizer, VoiceMap};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Monotonically increasing identifier of one script-to-audio run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RunId(pub u64);

impl RunId {
    pub fn next(self) -> Self {
        RunId(self.0 + 1)
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// One line to synthesize.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub segment_id: SegmentId,
    pub speaker: Speaker,
    pub text: String,
}

/// All synthesis work for one run, in script order.
#[derive(Debug, Clone)]
pub struct SynthesisJob {
    pub run: RunId,
    pub requests: Vec<SynthesisRequest>,
}

/// Tally of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisReport {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl SynthesisReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Progress of a run, as seen by whoever owns the segments.
#[derive(Debug)]
pub enum SynthesisEvent {
    /// A request was sent for this segment.
    Started { run: RunId, segment_id: SegmentId },
    /// The segment's request came back.
    Finished {
        run: RunId,
        segment_id: SegmentId,
        outcome: std::result::Result<AudioHandle, String>,
    },
    /// Every request of the run has come back.
    Settled { run: RunId, report: SynthesisReport },
}

impl SynthesisEvent {
    pub fn run(&self) -> RunId {
        match self {
            SynthesisEvent::Started { run, .. }
            | SynthesisEvent::Finished { run, .. }
            | SynthesisEvent::Settled { run, .. } => *run,
        }
    }
}

/// Runs synthesis jobs against a speech synthesizer.
#[derive(Clone)]
pub struct Synthesizer {
    tts: Arc<dyn SpeechSynthesizer>,
    voices: VoiceMap,
    max_concurrent: usize,
}

impl Synthesizer {
    /// Create a strictly sequential synthesizer.
    pub fn new(tts: Arc<dyn SpeechSynthesizer>, voices: VoiceMap) -> Self {
        Self::with_concurrency(tts, voices, 1)
    }

    /// Create a synthesizer allowing up to `max_concurrent` requests in flight.
    pub fn with_concurrency(
        tts: Arc<dyn SpeechSynthesizer>,
        voices: VoiceMap,
        max_concurrent: usize,
    ) -> Self {
        Self {
            tts,
            voices,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Synthesize every request of `job`, streaming events to `events`.
    ///
    /// With a concurrency of one, requests go out one at a time in script
    /// order. Stops sending new requests once the receiver is gone.
    #[instrument(skip(self, job, events), fields(run = %job.run, requests = job.requests.len()))]
    pub async fn run(
        &self,
        job: SynthesisJob,
        events: mpsc::UnboundedSender<SynthesisEvent>,
    ) -> SynthesisReport {
        let run = job.run;
        let mut report = SynthesisReport {
            requested: job.requests.len(),
            ..Default::default()
        };

        info!(
            "Synthesizing {} segments with {} (max {} in flight)",
            report.requested,
            self.tts.name(),
            self.max_concurrent
        );

        let mut results = stream::iter(job.requests)
            .take_while(|_| futures::future::ready(!events.is_closed()))
            .map(|request| {
                let events = events.clone();
                async move {
                    let _ = events.send(SynthesisEvent::Started {
                        run,
                        segment_id: request.segment_id,
                    });
                    let outcome = self.synthesize_one(&request).await;
                    (request.segment_id, outcome)
                }
            })
            .buffer_unordered(self.max_concurrent);

        while let Some((segment_id, outcome)) = results.next().await {
            let outcome = match outcome {
                Ok(audio) => {
                    report.succeeded += 1;
                    Ok(audio)
                }
                Err(e) => {
                    warn!("Segment {} failed: {}", segment_id, e);
                    report.failed += 1;
                    Err(e.to_string())
                }
            };

            if events
                .send(SynthesisEvent::Finished {
                    run,
                    segment_id,
                    outcome,
                })
                .is_err()
            {
                debug!("Nobody is listening for {} any more", run);
            }
        }

        let _ = events.send(SynthesisEvent::Settled { run, report });
        info!(
            "Synthesis finished: {} ok, {} failed",
            report.succeeded, report.failed
        );
        report
    }

    #[instrument(skip(self, request), fields(segment = %request.segment_id, speaker = %request.speaker))]
    async fn synthesize_one(&self, request: &SynthesisRequest) -> Result<AudioHandle> {
        let voice = self.voices.voice_for(request.speaker);
        self.tts.synthesize(&request.text, voice).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted speech synthesizer for tests.

    use super::*;
    use crate::error::CastlineError;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Succeeds unless the text contains "FAIL"; sleeps per text when asked to.
    pub struct ScriptedTts {
        pub dir: PathBuf,
        pub latencies: Vec<(String, Duration)>,
        pub calls: Mutex<Vec<(String, String)>>,
        pub in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
    }

    impl ScriptedTts {
        pub fn new(dir: &std::path::Path) -> Self {
            Self {
                dir: dir.to_path_buf(),
                latencies: Vec::new(),
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        pub fn with_latencies(mut self, latencies: Vec<(&str, u64)>) -> Self {
            self.latencies = latencies
                .into_iter()
                .map(|(t, ms)| (t.to_string(), Duration::from_millis(ms)))
                .collect();
            self
        }

        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for ScriptedTts {
        async fn synthesize(&self, text: &str, voice: &str) -> Result<AudioHandle> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), voice.to_string()));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some((_, delay)) = self.latencies.iter().find(|(t, _)| t == text) {
                tokio::time::sleep(*delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if text.contains("FAIL") {
                return Err(CastlineError::Tts(format!("refused: {}", text)));
            }
            AudioHandle::from_bytes(text.as_bytes(), "audio/mpeg", &self.dir)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedTts;
    use super::*;

    fn job(texts: &[(&str, Speaker)]) -> SynthesisJob {
        SynthesisJob {
            run: RunId(7),
            requests: texts
                .iter()
                .map(|(text, speaker)| SynthesisRequest {
                    segment_id: SegmentId::new(),
                    speaker: *speaker,
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    async fn collect(mut rx: mpsc::UnboundedReceiver<SynthesisEvent>) -> Vec<SynthesisEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_sequential_in_script_order_with_voice_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let tts = Arc::new(ScriptedTts::new(dir.path()));
        let synth = Synthesizer::new(tts.clone(), VoiceMap::GOOGLE);
        let (tx, rx) = mpsc::unbounded_channel();

        let report = synth
            .run(
                job(&[("one", Speaker::Host), ("two", Speaker::Guest), ("three", Speaker::Host)]),
                tx,
            )
            .await;

        assert_eq!(report, SynthesisReport { requested: 3, succeeded: 3, failed: 0 });
        assert_eq!(
            tts.calls(),
            vec![
                ("one".to_string(), VoiceMap::GOOGLE.host.to_string()),
                ("two".to_string(), VoiceMap::GOOGLE.guest.to_string()),
                ("three".to_string(), VoiceMap::GOOGLE.host.to_string()),
            ]
        );
        assert_eq!(tts.max_in_flight.load(std::sync::atomic::Ordering::SeqCst), 1);

        let events = collect(rx).await;
        assert!(events.iter().all(|e| e.run() == RunId(7)));
        assert!(matches!(events.last(), Some(SynthesisEvent::Settled { .. })));
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_run() {
        let dir = tempfile::tempdir().unwrap();
        let tts = Arc::new(ScriptedTts::new(dir.path()));
        let synth = Synthesizer::new(tts.clone(), VoiceMap::GOOGLE);
        let (tx, rx) = mpsc::unbounded_channel();

        let report = synth
            .run(
                job(&[("first", Speaker::Host), ("FAIL me", Speaker::Guest), ("last", Speaker::Host)]),
                tx,
            )
            .await;

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert!(report.has_failures());
        assert_eq!(tts.calls().len(), 3);

        let finished: Vec<bool> = collect(rx)
            .await
            .into_iter()
            .filter_map(|e| match e {
                SynthesisEvent::Finished { outcome, .. } => Some(outcome.is_ok()),
                _ => None,
            })
            .collect();
        assert_eq!(finished, vec![true, false, true]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_pool_respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let tts = Arc::new(
            ScriptedTts::new(dir.path())
                .with_latencies(vec![("a", 30), ("b", 10), ("c", 20), ("d", 5)]),
        );
        let synth = Synthesizer::with_concurrency(tts.clone(), VoiceMap::OPENAI, 2);
        let (tx, _rx) = mpsc::unbounded_channel();

        let report = synth
            .run(
                job(&[
                    ("a", Speaker::Host),
                    ("b", Speaker::Guest),
                    ("c", Speaker::Host),
                    ("d", Speaker::Guest),
                ]),
                tx,
            )
            .await;

        assert_eq!(report.succeeded, 4);
        assert_eq!(tts.max_in_flight.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stops_when_receiver_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let tts = Arc::new(ScriptedTts::new(dir.path()));
        let synth = Synthesizer::new(tts.clone(), VoiceMap::GOOGLE);
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        let report = synth
            .run(job(&[("one", Speaker::Host), ("two", Speaker::Guest)]), tx)
            .await;

        assert_eq!(report.requested, 2);
        assert!(tts.calls().is_empty());
    }
}
