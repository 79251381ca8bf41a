//! Podcast output formatting (JSON, SRT, VTT) and clip export.
//!
//! Segment times are positions on the global timeline, so the subtitle
//! formats line up with the clips played back to back.

use crate::error::Result;
use crate::script::Speaker;
use crate::segment::Segment;
use crate::session::PodcastSession;
use crate::timeline::Timeline;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Srt,
    Vtt,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Srt => "srt",
            OutputFormat::Vtt => "vtt",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" | "webvtt" => Ok(OutputFormat::Vtt),
            _ => Err(format!("Unknown format: {}. Use json, srt, or vtt.", s)),
        }
    }
}

/// JSON-serializable podcast manifest.
#[derive(Debug, Serialize)]
pub struct PodcastExport {
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    pub segments: Vec<SegmentExport>,
}

#[derive(Debug, Serialize)]
pub struct SegmentExport {
    pub index: usize,
    pub speaker: Speaker,
    pub text: String,
    pub raw_text: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&PodcastSession> for PodcastExport {
    fn from(session: &PodcastSession) -> Self {
        let timeline = Timeline::from_segments(session.segments(), session.durations());

        Self {
            duration_seconds: timeline.overall_duration(),
            banner: session.banner().map(str::to_string),
            segments: session
                .segments()
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    let start = timeline.offset_of(i);
                    SegmentExport {
                        index: i,
                        speaker: s.speaker,
                        text: s.cleaned_text.clone(),
                        raw_text: s.raw_text.clone(),
                        start_seconds: start,
                        end_seconds: start + timeline.duration_of(i),
                        clip: clip_file_name(i, s),
                        error: s.error().map(str::to_string),
                    }
                })
                .collect(),
        }
    }
}

/// File name a segment's clip is exported under, if it has one.
pub fn clip_file_name(index: usize, segment: &Segment) -> Option<String> {
    segment.audio().map(|audio| {
        format!(
            "{:03}-{}.{}",
            index + 1,
            segment.speaker.to_string().to_lowercase(),
            audio.extension()
        )
    })
}

/// Format a podcast for output.
pub fn format_podcast(session: &PodcastSession, format: OutputFormat) -> String {
    let export = PodcastExport::from(session);
    match format {
        OutputFormat::Json => format_json(&export),
        OutputFormat::Srt => format_cues(&export, format_srt_timestamp, false),
        OutputFormat::Vtt => format_cues(&export, format_vtt_timestamp, true),
    }
}

/// Copy every synthesized clip into `dir`. Returns how many were written.
pub fn export_clips(session: &PodcastSession, dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir)?;

    let mut written = 0;
    for (i, segment) in session.segments().iter().enumerate() {
        if let (Some(audio), Some(name)) = (segment.audio(), clip_file_name(i, segment)) {
            audio.copy_to(&dir.join(&name))?;
            debug!("Exported {}", name);
            written += 1;
        }
    }

    info!("Exported {} clips to {}", written, dir.display());
    Ok(written)
}

fn format_json(export: &PodcastExport) -> String {
    serde_json::to_string_pretty(export).unwrap_or_else(|_| "{}".to_string())
}

/// Shared SRT/VTT body. Only spoken segments with a span become cues.
fn format_cues(export: &PodcastExport, timestamp: fn(f64) -> String, vtt: bool) -> String {
    let mut output = if vtt {
        String::from("WEBVTT\n\n")
    } else {
        String::new()
    };

    let spoken = export
        .segments
        .iter()
        .filter(|s| !s.text.is_empty() && s.end_seconds > s.start_seconds);

    for (n, segment) in spoken.enumerate() {
        output.push_str(&format!("{}\n", n + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            timestamp(segment.start_seconds),
            timestamp(segment.end_seconds)
        ));
        if vtt {
            output.push_str(&format!("<v {}>{}", segment.speaker, segment.text));
        } else {
            output.push_str(&format!("{}: {}", segment.speaker, segment.text));
        }
        output.push_str("\n\n");
    }

    output
}

fn split_millis(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000,
    )
}

/// Format timestamp for SRT (00:00:00,000).
fn format_srt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_millis(seconds);
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Format timestamp for VTT (00:00:00.000).
fn format_vtt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_millis(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}
