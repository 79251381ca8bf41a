//! Global timeline arithmetic over an ordered segment list.
//!
//! The timeline is derived, never stored: every query rebuilds it from the
//! segments and the duration cache. Segments without a known duration span
//! zero seconds and can never be the target of an in-range seek.

use crate::duration::DurationMap;
use crate::segment::Segment;

/// One segment's extent on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub duration: f64,
    pub playable: bool,
}

/// Where a global time lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekTarget {
    /// Inside a segment's span, `offset` seconds from its start.
    Within { index: usize, offset: f64 },
    /// At or past the end; clamped to the tail of the last playable segment.
    PastEnd { index: usize, offset: f64 },
    /// Nothing on the timeline can play.
    Empty,
}

impl SeekTarget {
    pub fn index(&self) -> Option<usize> {
        match self {
            SeekTarget::Within { index, .. } | SeekTarget::PastEnd { index, .. } => Some(*index),
            SeekTarget::Empty => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    spans: Vec<Span>,
}

impl Timeline {
    pub fn from_segments(segments: &[Segment], durations: &DurationMap) -> Self {
        Self {
            spans: segments
                .iter()
                .map(|s| Span {
                    duration: durations.get(&s.id),
                    playable: s.is_playable(),
                })
                .collect(),
        }
    }

    pub fn from_spans(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn duration_of(&self, index: usize) -> f64 {
        self.spans.get(index).map(|s| s.duration).unwrap_or(0.0)
    }

    pub fn overall_duration(&self) -> f64 {
        self.spans.iter().map(|s| s.duration).sum()
    }

    /// Start of segment `index` on the global timeline.
    pub fn offset_of(&self, index: usize) -> f64 {
        self.spans.iter().take(index).map(|s| s.duration).sum()
    }

    /// Global time for a local position inside segment `index`.
    pub fn global_time(&self, index: usize, local: f64) -> f64 {
        self.offset_of(index) + local.max(0.0)
    }

    /// Resolve a global time to a segment and an in-segment offset.
    ///
    /// Negative or NaN times count as 0. Times at or past the end resolve to
    /// the last playable segment, `epsilon` seconds before its end.
    pub fn locate(&self, t: f64, epsilon: f64) -> SeekTarget {
        let t = if t.is_nan() || t < 0.0 { 0.0 } else { t };

        let mut start = 0.0;
        for (index, span) in self.spans.iter().enumerate() {
            let end = start + span.duration;
            if span.duration > 0.0 && t >= start && t < end {
                return SeekTarget::Within {
                    index,
                    offset: t - start,
                };
            }
            start = end;
        }

        match self.spans.iter().rposition(|s| s.playable) {
            Some(index) => SeekTarget::PastEnd {
                index,
                offset: (self.spans[index].duration - epsilon).max(0.0),
            },
            None => SeekTarget::Empty,
        }
    }
}

/// Format seconds as `MM:SS`.
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(durations: &[f64]) -> Timeline {
        Timeline::from_spans(
            durations
                .iter()
                .map(|&d| Span {
                    duration: d,
                    playable: d > 0.0,
                })
                .collect(),
        )
    }

    #[test]
    fn test_zero_span_segment_is_skipped() {
        let tl = timeline(&[10.0, 0.0, 15.0]);

        assert_eq!(tl.overall_duration(), 25.0);
        assert_eq!(tl.locate(12.0, 0.01), SeekTarget::Within { index: 2, offset: 2.0 });
        assert_eq!(tl.locate(10.0, 0.01), SeekTarget::Within { index: 2, offset: 0.0 });
        assert_eq!(tl.locate(0.0, 0.01), SeekTarget::Within { index: 0, offset: 0.0 });
    }

    #[test]
    fn test_past_end_clamps_to_last_playable() {
        let tl = timeline(&[10.0, 15.0, 0.0]);

        match tl.locate(25.0, 0.01) {
            SeekTarget::PastEnd { index, offset } => {
                assert_eq!(index, 1);
                assert!((offset - 14.99).abs() < 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(tl.locate(1000.0, 0.01).index(), Some(1));
    }

    #[test]
    fn test_every_in_range_time_hits_one_segment() {
        let durations = [3.5, 0.0, 0.25, 7.0, 0.0, 1.0];
        let tl = timeline(&durations);
        let overall = tl.overall_duration();

        let mut t = 0.0;
        while t < overall {
            match tl.locate(t, 0.01) {
                SeekTarget::Within { index, offset } => {
                    assert!(offset >= 0.0);
                    assert!(offset < durations[index]);
                    assert!((tl.global_time(index, offset) - t).abs() < 1e-9);
                }
                other => panic!("t={} resolved to {:?}", t, other),
            }
            t += 0.05;
        }
    }

    #[test]
    fn test_bad_times_and_empty_timelines() {
        let tl = timeline(&[4.0]);
        assert_eq!(tl.locate(-3.0, 0.01), SeekTarget::Within { index: 0, offset: 0.0 });
        assert_eq!(tl.locate(f64::NAN, 0.01), SeekTarget::Within { index: 0, offset: 0.0 });

        assert_eq!(timeline(&[]).locate(1.0, 0.01), SeekTarget::Empty);
        assert_eq!(timeline(&[0.0, 0.0]).locate(0.0, 0.01), SeekTarget::Empty);
    }

    #[test]
    fn test_offsets() {
        let tl = timeline(&[10.0, 0.0, 15.0]);
        assert_eq!(tl.offset_of(0), 0.0);
        assert_eq!(tl.offset_of(2), 10.0);
        assert_eq!(tl.global_time(2, 4.5), 14.5);
        assert_eq!(tl.duration_of(9), 0.0);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(65.9), "01:05");
        assert_eq!(format_clock(3600.0), "60:00");
        assert_eq!(format_clock(f64::NAN), "00:00");
        assert_eq!(format_clock(-1.0), "00:00");
    }
}
