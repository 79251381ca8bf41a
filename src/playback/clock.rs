//! Timer-driven audio output.
//!
//! Keeps a playhead in step with the wall clock and reports it on a fixed
//! tick. The duration hint given at load time decides when a clip ends.
//! An optional [`FfplaySink`] makes the playback audible.

use super::{AudioOutput, FfplaySink, OutputEvent};
use crate::audio::AudioHandle;
use crate::error::{CastlineError, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::warn;

#[derive(Debug, Default)]
struct Playhead {
    source: u64,
    path: Option<PathBuf>,
    duration: f64,
    /// Position when the clock last stopped running.
    base: f64,
    /// Set while running.
    started_at: Option<Instant>,
}

impl Playhead {
    fn position(&self) -> f64 {
        let elapsed = self
            .started_at
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.base + elapsed).min(self.duration)
    }

    fn freeze(&mut self) {
        self.base = self.position();
        self.started_at = None;
    }
}

pub struct ClockOutput {
    playhead: Arc<Mutex<Playhead>>,
    events: mpsc::UnboundedSender<OutputEvent>,
    tick: Duration,
    ticker: Option<JoinHandle<()>>,
    sink: Option<FfplaySink>,
}

impl ClockOutput {
    /// Create a silent clock and the receiver for its events.
    pub fn new(tick: Duration) -> (Self, mpsc::UnboundedReceiver<OutputEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let output = Self {
            playhead: Arc::new(Mutex::new(Playhead::default())),
            events: tx,
            tick: tick.max(Duration::from_millis(10)),
            ticker: None,
            sink: None,
        };
        (output, rx)
    }

    /// Create a clock that also plays clips through ffplay.
    pub fn with_sink(tick: Duration, sink: FfplaySink) -> (Self, mpsc::UnboundedReceiver<OutputEvent>) {
        let (mut output, rx) = Self::new(tick);
        output.sink = Some(sink);
        (output, rx)
    }

    fn lock(&self) -> MutexGuard<'_, Playhead> {
        self.playhead.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.stop();
        }
    }

    fn spawn_ticker(&mut self, source: u64) {
        let playhead = Arc::clone(&self.playhead);
        let events = self.events.clone();
        let tick = self.tick;

        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.tick().await;
            loop {
                interval.tick().await;
                let (position, ended) = {
                    let mut head = playhead.lock().unwrap_or_else(|e| e.into_inner());
                    if head.source != source || head.started_at.is_none() {
                        return;
                    }
                    let position = head.position();
                    let ended = position >= head.duration;
                    if ended {
                        head.freeze();
                    }
                    (position, ended)
                };

                let _ = events.send(OutputEvent::TimeUpdate { source, position });
                if ended {
                    let _ = events.send(OutputEvent::Ended { source });
                    return;
                }
            }
        }));
    }

    fn restart_sink(&mut self, path: Option<PathBuf>, offset: f64) -> Result<()> {
        match (self.sink.as_mut(), path) {
            (Some(sink), Some(path)) => sink.start(&path, offset),
            _ => Ok(()),
        }
    }
}

impl AudioOutput for ClockOutput {
    fn load(&mut self, audio: &AudioHandle, duration_hint: f64) -> Result<()> {
        self.stop_ticker();
        let mut head = self.lock();
        head.source += 1;
        head.path = Some(audio.path().to_path_buf());
        head.duration = duration_hint.max(0.0);
        head.base = 0.0;
        head.started_at = None;
        Ok(())
    }

    fn source_id(&self) -> u64 {
        self.lock().source
    }

    fn seek(&mut self, offset: f64) {
        let (running, path, offset) = {
            let mut head = self.lock();
            head.base = offset.clamp(0.0, head.duration);
            let running = head.started_at.is_some();
            if running {
                head.started_at = Some(Instant::now());
            }
            (running, head.path.clone(), head.base)
        };

        if running {
            if let Err(e) = self.restart_sink(path, offset) {
                warn!("Could not resume audio after seek: {}", e);
            }
        }
    }

    fn position(&self) -> f64 {
        self.lock().position()
    }

    fn play(&mut self) -> Result<()> {
        let (source, path, offset) = {
            let mut head = self.lock();
            if head.path.is_none() {
                return Err(CastlineError::Playback("No audio loaded".to_string()));
            }
            if head.started_at.is_some() {
                return Ok(());
            }
            head.started_at = Some(Instant::now());
            (head.source, head.path.clone(), head.base)
        };

        if let Err(e) = self.restart_sink(path, offset) {
            self.lock().started_at = None;
            return Err(e);
        }
        self.spawn_ticker(source);
        let _ = self.events.send(OutputEvent::Started { source });
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.lock().started_at.is_some()
    }

    fn pause(&mut self) {
        self.stop_ticker();
        let source = {
            let mut head = self.lock();
            if head.started_at.is_none() {
                return;
            }
            head.freeze();
            head.source
        };
        let _ = self.events.send(OutputEvent::Paused { source });
    }

    fn stop(&mut self) {
        self.stop_ticker();
        let mut head = self.lock();
        head.source += 1;
        head.path = None;
        head.duration = 0.0;
        head.base = 0.0;
        head.started_at = None;
    }
}

impl Drop for ClockOutput {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
