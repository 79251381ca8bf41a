//! Duration resolution for synthesized segments.

use crate::audio::DurationProbe;
use crate::error::{CastlineError, Result};
use crate::segment::{Segment, SegmentId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Cached playable duration per segment, in seconds.
///
/// Entries are never overwritten once recorded.
#[derive(Debug, Clone, Default)]
pub struct DurationMap {
    entries: HashMap<SegmentId, f64>,
}

impl DurationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration of a segment, 0 when unknown.
    pub fn get(&self, id: &SegmentId) -> f64 {
        self.entries.get(id).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, id: &SegmentId) -> bool {
        self.entries.contains_key(id)
    }

    /// Record a duration unless one is already known. Returns whether it was recorded.
    pub fn record(&mut self, id: SegmentId, seconds: f64) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        let seconds = if seconds.is_finite() && seconds > 0.0 {
            seconds
        } else {
            0.0
        };
        self.entries.insert(id, seconds);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Sum of durations of the given segments, in order.
    pub fn total(&self, segments: &[Segment]) -> f64 {
        segments.iter().map(|s| self.get(&s.id)).sum()
    }

    /// Per-segment durations in segment order.
    pub fn in_order(&self, segments: &[Segment]) -> Vec<f64> {
        segments.iter().map(|s| self.get(&s.id)).collect()
    }
}

/// Probes settled segments for their durations.
#[derive(Clone)]
pub struct DurationResolver {
    probe: Arc<dyn DurationProbe>,
    timeout: Duration,
}

impl DurationResolver {
    pub fn new(probe: Arc<dyn DurationProbe>, timeout: Duration) -> Self {
        Self { probe, timeout }
    }

    /// Fill `cache` for every segment and return the overall duration.
    ///
    /// Refuses to run while any segment is still synthesizing. A failed or
    /// timed-out probe records 0 for that segment.
    #[instrument(skip_all, fields(segments = segments.len()))]
    pub async fn resolve(&self, segments: &[Segment], cache: &mut DurationMap) -> Result<f64> {
        if !segments.iter().all(Segment::is_settled) {
            return Err(CastlineError::SynthesisInFlight);
        }

        for segment in segments {
            if cache.contains(&segment.id) {
                continue;
            }

            let seconds = match segment.audio() {
                Some(audio) => match tokio::time::timeout(self.timeout, self.probe.probe(audio)).await {
                    Ok(Ok(seconds)) => seconds,
                    Ok(Err(e)) => {
                        warn!("Could not read duration of {}: {}", segment.id, e);
                        0.0
                    }
                    Err(_) => {
                        warn!(
                            "{}",
                            CastlineError::ProbeTimeout(self.timeout.as_secs())
                        );
                        0.0
                    }
                },
                None => 0.0,
            };

            debug!("{} lasts {:.2}s", segment.id, seconds);
            cache.record(segment.id, seconds);
        }

        Ok(cache.total(segments))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Duration probe double reading the clip's byte length as seconds.

    use super::*;
    use crate::audio::AudioHandle;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct ByteLenProbe {
        pub calls: AtomicUsize,
        /// Clips of exactly this many bytes never answer.
        pub hang_on_len: Option<u64>,
    }

    impl ByteLenProbe {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DurationProbe for ByteLenProbe {
        async fn probe(&self, audio: &AudioHandle) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if Some(audio.byte_len()) == self.hang_on_len {
                futures::future::pending::<()>().await;
            }
            Ok(audio.byte_len() as f64)
        }
    }
}
