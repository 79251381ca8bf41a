//! Castline - two-voice podcast synthesis
//!
//! Turns a loosely structured Host/Guest dialogue script into synthesized
//! audio clips and plays them back as one continuous, seekable timeline.
//!
//! # Overview
//!
//! Castline allows you to:
//! - Parse AI-generated dialogue into speaker-attributed segments
//! - Synthesize each segment with Google Cloud or OpenAI text-to-speech
//! - Measure every clip and lay them out on a single timeline
//! - Play, pause and seek across segment boundaries
//! - Export clips with a JSON, SRT or WebVTT manifest
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `script` - Script screening, parsing and TTS text cleanup
//! - `audio` - Owned audio clips and duration probing
//! - `tts` - Text-to-speech providers
//! - `synthesis` - Per-segment synthesis runs
//! - `session` - Segment list, clip ownership and run tracking
//! - `duration` - Duration cache and resolver
//! - `timeline` - Global time arithmetic
//! - `playback` - Transport state machine and audio outputs
//! - `export` - Manifest formats and clip export
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use castline::config::Settings;
//! use castline::orchestrator::Orchestrator;
//! use castline::session::PodcastSession;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!     let mut session = PodcastSession::new();
//!
//!     let script = "Host: Welcome to the show.\nGuest: Glad to be here.\n";
//!     let result = orchestrator.produce(&mut session, script, None).await?;
//!     println!("{} segments, {:.1}s", result.segments, result.overall_duration);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod duration;
pub mod error;
pub mod export;
pub mod openai;
pub mod orchestrator;
pub mod playback;
pub mod script;
pub mod segment;
pub mod session;
pub mod synthesis;
pub mod timeline;
pub mod tts;

pub use error::{CastlineError, Result};
