//! Audible playback through an `ffplay` child process.

use crate::error::{CastlineError, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::debug;

/// Plays clips by spawning `ffplay`, one process at a time.
#[derive(Debug)]
pub struct FfplaySink {
    binary: String,
    child: Option<Child>,
}

impl FfplaySink {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
            child: None,
        }
    }

    /// Start playing `path` from `offset` seconds, replacing any running clip.
    pub fn start(&mut self, path: &Path, offset: f64) -> Result<()> {
        self.stop();

        let spawned = Command::new(&self.binary)
            .arg("-nodisp")
            .arg("-autoexit")
            .arg("-loglevel").arg("quiet")
            .arg("-ss").arg(format!("{:.3}", offset.max(0.0)))
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        match spawned {
            Ok(child) => {
                debug!("ffplay started for {} at {:.2}s", path.display(), offset);
                self.child = Some(child);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CastlineError::ToolNotFound(self.binary.clone()))
            }
            Err(e) => Err(CastlineError::Playback(format!("Failed to start ffplay: {}", e))),
        }
    }

    /// Kill the running clip, if any.
    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
        }
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }
}

impl Drop for FfplaySink {
    fn drop(&mut self) {
        self.stop();
    }
}
