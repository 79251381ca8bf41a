//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{CastlineError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Synthesis requires an API key and ffprobe.
    Synthesize,
    /// Playback additionally requires ffplay unless silent.
    Play { silent: bool },
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Synthesize => {
            check_api_key(settings)?;
            check_tool(&settings.probe.ffprobe_path)?;
        }
        Operation::Play { silent } => {
            check_api_key(settings)?;
            check_tool(&settings.probe.ffprobe_path)?;
            if !silent {
                check_tool(&settings.playback.ffplay_path)?;
            }
        }
    }
    Ok(())
}

/// Check that the configured provider has an API key.
fn check_api_key(settings: &Settings) -> Result<()> {
    let env = settings.tts.provider.api_key_env();
    match settings.tts.resolve_api_key() {
        Some(_) => Ok(()),
        None => Err(CastlineError::Config(format!(
            "No {} API key configured. Set it with: export {}='...' (or tts.api_key in the config file)",
            settings.tts.provider, env
        ))),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(CastlineError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CastlineError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(CastlineError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
