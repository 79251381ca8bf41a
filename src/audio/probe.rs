//! Audio duration probing.

use super::AudioHandle;
use crate::error::{CastlineError, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Something that can tell how long a clip plays.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Return the playable duration of a clip in seconds.
    async fn probe(&self, audio: &AudioHandle) -> Result<f64>;
}

/// Duration probe backed by `ffprobe`.
pub struct FfprobeProbe {
    binary: String,
}

impl FfprobeProbe {
    /// Create a probe using `ffprobe` from the PATH.
    pub fn new() -> Self {
        Self::with_binary("ffprobe")
    }

    /// Create a probe using a specific ffprobe binary.
    pub fn with_binary(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DurationProbe for FfprobeProbe {
    #[instrument(skip(self, audio), fields(path = %audio.path().display()))]
    async fn probe(&self, audio: &AudioHandle) -> Result<f64> {
        let duration = probe_duration(&self.binary, audio.path()).await?;
        debug!("Clip duration {:.2}s", duration);
        Ok(duration)
    }
}

/// Queries the duration of an audio file using ffprobe with JSON output.
async fn probe_duration(binary: &str, path: &Path) -> Result<f64> {
    let result = Command::new(binary)
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .kill_on_drop(true)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CastlineError::ToolNotFound(binary.to_string()));
        }
        Err(e) => {
            return Err(CastlineError::Probe(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(CastlineError::Probe("ffprobe returned error".into()));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    parse_ffprobe_duration(&json_str)
}

/// Extract `format.duration` from ffprobe's JSON report.
fn parse_ffprobe_duration(json_str: &str) -> Result<f64> {
    let parsed: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|_| CastlineError::Probe("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| CastlineError::Probe("Could not determine audio duration".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ffprobe_duration() {
        let json = r#"{"format": {"filename": "clip.mp3", "duration": "12.480000"}}"#;
        assert!((parse_ffprobe_duration(json).unwrap() - 12.48).abs() < 1e-9);
    }

    #[test]
    fn test_parse_ffprobe_missing_duration() {
        assert!(parse_ffprobe_duration(r#"{"format": {}}"#).is_err());
        assert!(parse_ffprobe_duration("not json").is_err());
        assert!(parse_ffprobe_duration(r#"{"format": {"duration": "N/A"}}"#).is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_maps_to_tool_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let handle = AudioHandle::from_bytes(b"abc", "audio/mpeg", dir.path()).unwrap();
        let probe = FfprobeProbe::with_binary("castline-no-such-ffprobe");

        let err = probe.probe(&handle).await.unwrap_err();
        assert!(matches!(err, CastlineError::ToolNotFound(_)));
    }
}
