//! Pipeline orchestrator for Castline.
//!
//! Coordinates the whole process from script text to a playable timeline.

use crate::audio::{DurationProbe, FfprobeProbe};
use crate::config::Settings;
use crate::duration::DurationResolver;
use crate::error::Result;
use crate::session::PodcastSession;
use crate::synthesis::{SynthesisEvent, Synthesizer};
use crate::tts::{create_synthesizer, SpeechSynthesizer, VoiceMap};
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, instrument};

/// The main orchestrator for the Castline pipeline.
pub struct Orchestrator {
    settings: Settings,
    synthesizer: Synthesizer,
    resolver: DurationResolver,
}

impl Orchestrator {
    /// Create a new orchestrator from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let tts = create_synthesizer(&settings)?;
        info!("Using {} speech synthesis", tts.name());

        let probe: Arc<dyn DurationProbe> =
            Arc::new(FfprobeProbe::with_binary(&settings.probe.ffprobe_path));

        Self::with_components(settings, tts, probe)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        tts: Arc<dyn SpeechSynthesizer>,
        probe: Arc<dyn DurationProbe>,
    ) -> Result<Self> {
        std::fs::create_dir_all(settings.temp_dir())?;

        let synthesizer = Synthesizer::with_concurrency(
            tts,
            VoiceMap::for_provider(settings.tts.provider),
            settings.synthesis.max_concurrent,
        );
        let resolver = DurationResolver::new(
            probe,
            Duration::from_secs(settings.probe.timeout_secs),
        );

        Ok(Self {
            settings,
            synthesizer,
            resolver,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Turn `script` into synthesized, timed segments held by `session`.
    ///
    /// Only an unusable script is an error. Failed segments are recorded on
    /// the session and reported in the result.
    #[instrument(skip_all, fields(chars = script.len()))]
    pub async fn produce(
        &self,
        session: &mut PodcastSession,
        script: &str,
        progress: Option<&ProgressBar>,
    ) -> Result<ProduceResult> {
        let job = session.load_script(script)?;
        if let Some(pb) = progress {
            pb.set_length(job.requests.len() as u64);
            pb.set_position(0);
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let synthesis = self.synthesizer.run(job, tx);
        let apply = async {
            while let Some(event) = rx.recv().await {
                if let (Some(pb), SynthesisEvent::Finished { .. }) = (progress, &event) {
                    pb.inc(1);
                }
                session.apply(event);
            }
        };
        let (report, ()) = tokio::join!(synthesis, apply);

        if let Some(pb) = progress {
            pb.set_message("Measuring clips...");
        }
        let (segments, durations) = session.resolve_parts();
        let overall_duration = self.resolver.resolve(segments, durations).await?;

        info!(
            "Produced {} segments, {:.1}s of audio",
            session.segments().len(),
            overall_duration
        );

        Ok(ProduceResult {
            segments: session.segments().len(),
            synthesized: report.succeeded,
            failed: report.failed,
            overall_duration,
            banner: session.banner().map(str::to_string),
        })
    }
}

/// Result of producing a podcast.
#[derive(Debug, Clone, PartialEq)]
pub struct ProduceResult {
    /// Number of segments, cues included.
    pub segments: usize,
    /// Segments with audio.
    pub synthesized: usize,
    /// Segments whose synthesis failed.
    pub failed: usize,
    /// Length of the whole timeline in seconds.
    pub overall_duration: f64,
    /// Banner to show, if any.
    pub banner: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::testing::ByteLenProbe;
    use crate::error::CastlineError;
    use crate::session::SEGMENTS_FAILED_BANNER;
    use crate::synthesis::testing::ScriptedTts;

    fn settings(dir: &std::path::Path, max_concurrent: usize) -> Settings {
        let mut settings = Settings::default();
        settings.general.temp_dir = dir.display().to_string();
        settings.synthesis.max_concurrent = max_concurrent;
        settings
    }

    const SCRIPT: &str = "Here is the script:\n\
        **Host:** Welcome back to the show.\n\
        Guest\n\
        Thanks for having me... really.\n\
        Host: [laughs]\n\
        Guest: This one will FAIL.\n\
        Host: (softly) Goodbye.\n";

    #[tokio::test]
    async fn test_produce_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let tts = Arc::new(ScriptedTts::new(dir.path()));
        let orchestrator = Orchestrator::with_components(
            settings(dir.path(), 1),
            tts.clone(),
            Arc::new(ByteLenProbe::default()),
        )
        .unwrap();
        let mut session = PodcastSession::new();

        let result = orchestrator.produce(&mut session, SCRIPT, None).await.unwrap();

        assert_eq!(result.segments, 5);
        assert_eq!(result.synthesized, 3);
        assert_eq!(result.failed, 1);
        assert_eq!(result.banner.as_deref(), Some(SEGMENTS_FAILED_BANNER));

        let calls = tts.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].0, "Welcome back to the show.");
        assert_eq!(calls[1].0, "Thanks for having me really.");
        assert_eq!(calls[1].1, VoiceMap::GOOGLE.guest);

        // ByteLenProbe reports one second per byte of clip.
        let expected: f64 = ["Welcome back to the show.", "Thanks for having me really.", "Goodbye."]
            .iter()
            .map(|t| t.len() as f64)
            .sum();
        assert_eq!(result.overall_duration, expected);
        assert_eq!(session.overall_duration(), expected);
        assert!(session.segments()[2].is_cue());
    }

    #[tokio::test]
    async fn test_unparseable_script_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tts = Arc::new(ScriptedTts::new(dir.path()));
        let orchestrator = Orchestrator::with_components(
            settings(dir.path(), 1),
            tts.clone(),
            Arc::new(ByteLenProbe::default()),
        )
        .unwrap();
        let mut session = PodcastSession::new();

        let err = orchestrator
            .produce(&mut session, "Random text with no speaker labels.\n", None)
            .await
            .unwrap_err();

        assert!(matches!(err, CastlineError::UnparseableScript));
        assert!(tts.calls().is_empty());
        assert!(session.banner().is_some());
    }

    /// Final segment contents, independent of clip file names.
    fn outcome(session: &PodcastSession) -> Vec<(String, Option<Vec<u8>>, Option<String>)> {
        session
            .segments()
            .iter()
            .map(|s| {
                (
                    s.cleaned_text.clone(),
                    s.audio().map(|a| std::fs::read(a.path()).unwrap()),
                    s.error().map(str::to_string),
                )
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_order_does_not_change_outcome() {
        let script = "Host: a one\nGuest: b FAIL two\nHost: c three\nGuest: d four\nHost: e five\n";
        let latencies = [
            vec![("a one", 50), ("b FAIL two", 10), ("c three", 40), ("d four", 5), ("e five", 20)],
            vec![("a one", 5), ("b FAIL two", 60), ("c three", 1), ("d four", 30), ("e five", 45)],
            vec![("a one", 25), ("b FAIL two", 25), ("c three", 70), ("d four", 15), ("e five", 0)],
        ];

        let dir = tempfile::tempdir().unwrap();
        let sequential = Orchestrator::with_components(
            settings(dir.path(), 1),
            Arc::new(ScriptedTts::new(dir.path())),
            Arc::new(ByteLenProbe::default()),
        )
        .unwrap();
        let mut baseline_session = PodcastSession::new();
        let baseline = sequential.produce(&mut baseline_session, script, None).await.unwrap();
        let expected = outcome(&baseline_session);

        for latency in latencies {
            let tts = Arc::new(ScriptedTts::new(dir.path()).with_latencies(latency));
            let concurrent = Orchestrator::with_components(
                settings(dir.path(), 3),
                tts,
                Arc::new(ByteLenProbe::default()),
            )
            .unwrap();
            let mut session = PodcastSession::new();

            let result = concurrent.produce(&mut session, script, None).await.unwrap();

            assert_eq!(outcome(&session), expected);
            assert_eq!(result.overall_duration, baseline.overall_duration);
            assert_eq!(result.failed, 1);
        }
    }
}
