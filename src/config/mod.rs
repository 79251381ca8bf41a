//! Configuration module for Castline.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    GeneralSettings, PlaybackSettings, ProbeSettings, Settings, SynthesisSettings, TtsProvider,
    TtsSettings,
};
