//! Owned handles to synthesized audio clips.

use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::TempPath;
use tracing::{debug, warn};

/// A playable audio clip backed by a temporary file.
///
/// The handle exclusively owns its backing file. [`AudioHandle::release`]
/// deletes it explicitly; dropping an unreleased handle deletes it too.
#[derive(Debug)]
pub struct AudioHandle {
    path: TempPath,
    mime_type: String,
    byte_len: u64,
}

impl AudioHandle {
    /// Materialize decoded audio bytes into a new clip file under `dir`.
    pub fn from_bytes(bytes: &[u8], mime_type: &str, dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let mut file = tempfile::Builder::new()
            .prefix("clip-")
            .suffix(extension_for(mime_type))
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        let path = file.into_temp_path();
        debug!("Wrote {} bytes of {} to {}", bytes.len(), mime_type, path.display());

        Ok(Self {
            path,
            mime_type: mime_type.to_string(),
            byte_len: bytes.len() as u64,
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size of the clip in bytes.
    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    /// File extension matching the clip's MIME type, without the dot.
    pub fn extension(&self) -> &'static str {
        extension_for(&self.mime_type).trim_start_matches('.')
    }

    /// Copy the clip to a persistent location.
    pub fn copy_to(&self, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&self.path, dest)?;
        Ok(())
    }

    /// Delete the backing file now.
    pub fn release(self) {
        let path = self.path.display().to_string();
        if let Err(e) = self.path.close() {
            warn!("Failed to release audio clip {}: {}", path, e);
        }
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/mpeg" | "audio/mp3" => ".mp3",
        "audio/wav" | "audio/x-wav" => ".wav",
        "audio/ogg" | "audio/opus" => ".ogg",
        "audio/flac" => ".flac",
        _ => ".bin",
    }
}
