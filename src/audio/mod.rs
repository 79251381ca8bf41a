//! Audio clip ownership and metadata.
//!
//! Synthesized clips live in temporary files owned by [`AudioHandle`]s;
//! [`DurationProbe`] implementations report how long each clip plays.

mod handle;
mod probe;

pub use handle::AudioHandle;
pub use probe::{DurationProbe, FfprobeProbe};
