//! CLI command implementations.

mod config;
mod doctor;
mod parse;
mod play;
mod synthesize;

pub use config::run_config;
pub use doctor::run_doctor;
pub use parse::run_parse;
pub use play::run_play;
pub use synthesize::run_synthesize;
