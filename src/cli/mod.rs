//! CLI module for Castline.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Castline - two-voice podcast synthesis
///
/// Turns a Host/Guest dialogue script into synthesized clips laid out on one
/// continuous, seekable timeline.
#[derive(Parser, Debug)]
#[command(name = "castline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Parse a script and print its segments
    Parse {
        /// Script file ("-" reads stdin)
        script: String,

        /// Print segments as JSON
        #[arg(long)]
        json: bool,
    },

    /// Synthesize a script and export the clips with a manifest
    Synthesize {
        /// Script file ("-" reads stdin)
        script: String,

        /// Directory to write clips and manifest into
        #[arg(short, long)]
        output: String,

        /// Manifest format (json, srt, vtt)
        #[arg(long, default_value = "json")]
        format: String,

        /// TTS provider override (google, openai)
        #[arg(long)]
        provider: Option<String>,
    },

    /// Synthesize a script and play it back interactively
    Play {
        /// Script file ("-" reads stdin)
        script: String,

        /// Run the transport without audible output
        #[arg(long)]
        silent: bool,

        /// TTS provider override (google, openai)
        #[arg(long)]
        provider: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,

    /// Validate the configuration file
    Check,
}

/// Read a script from a file, or from stdin when `source` is "-".
pub fn read_script(source: &str) -> anyhow::Result<String> {
    use std::io::Read;

    if source == "-" {
        let mut script = String::new();
        std::io::stdin().read_to_string(&mut script)?;
        Ok(script)
    } else {
        std::fs::read_to_string(source)
            .map_err(|e| anyhow::anyhow!("Failed to read script {}: {}", source, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_synthesize_args() {
        let cli = Cli::try_parse_from([
            "castline", "-vv", "synthesize", "script.txt", "--output", "out", "--format", "srt",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Synthesize { script, output, format, provider } => {
                assert_eq!(script, "script.txt");
                assert_eq!(output, "out");
                assert_eq!(format, "srt");
                assert!(provider.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_read_script_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.txt");
        std::fs::write(&path, "Host: Hi.\n").unwrap();

        assert_eq!(read_script(path.to_str().unwrap()).unwrap(), "Host: Hi.\n");
        assert!(read_script("/definitely/missing/script.txt").is_err());
    }
}
