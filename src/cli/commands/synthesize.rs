//! Synthesize command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{read_script, Output};
use crate::config::Settings;
use crate::export::{export_clips, format_podcast, OutputFormat};
use crate::orchestrator::Orchestrator;
use crate::session::PodcastSession;
use crate::timeline::format_clock;
use anyhow::Result;
use std::path::PathBuf;

/// Run the synthesize command.
pub async fn run_synthesize(
    source: &str,
    output: &str,
    format: &str,
    settings: Settings,
) -> Result<()> {
    let output_format: OutputFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    if let Err(e) = preflight::check(Operation::Synthesize, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'castline doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let script = read_script(source)?;
    let orchestrator = Orchestrator::new(settings)?;
    let mut session = PodcastSession::new();

    let pb = Output::progress_bar(0, "Synthesizing segments...");
    let result = orchestrator.produce(&mut session, &script, Some(&pb)).await;
    pb.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    for (i, segment) in session.segments().iter().enumerate() {
        Output::segment(i, segment, session.durations().get(&segment.id), false);
    }
    println!();

    let dir = PathBuf::from(output);
    let clips = export_clips(&session, &dir)?;
    let manifest = dir.join(format!("podcast.{}", output_format.extension()));
    std::fs::write(&manifest, format_podcast(&session, output_format))?;

    if let Some(banner) = &result.banner {
        Output::warning(banner);
    }
    Output::success(&format!(
        "Wrote {} clips ({}) and {}",
        clips,
        format_clock(result.overall_duration),
        manifest.display()
    ));

    Ok(())
}
