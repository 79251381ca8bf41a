//! Play command implementation.
//!
//! Synthesizes the script, then runs an interactive transport over the
//! produced timeline until the user quits.

use crate::cli::preflight::{self, Operation};
use crate::cli::{read_script, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::playback::{ClockOutput, FfplaySink, PlaybackController};
use crate::session::PodcastSession;
use anyhow::Result;
use console::style;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// A transport action typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TransportCommand {
    Toggle,
    Seek(f64),
    /// Zero-based segment index.
    Jump(usize),
    Stop,
    List,
    Help,
    Quit,
}

/// Parse one prompt line. Empty input toggles playback.
fn parse_command(input: &str) -> Option<TransportCommand> {
    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or("").to_lowercase();
    let arg = parts.next();

    match (command.as_str(), arg) {
        ("" | "p" | "play" | "pause", None) => Some(TransportCommand::Toggle),
        ("s" | "seek", Some(t)) => parse_time(t).map(TransportCommand::Seek),
        ("j" | "jump", Some(n)) => n
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(|n| TransportCommand::Jump(n - 1)),
        ("x" | "stop", None) => Some(TransportCommand::Stop),
        ("l" | "list", None) => Some(TransportCommand::List),
        ("h" | "help" | "?", None) => Some(TransportCommand::Help),
        ("q" | "quit" | "exit", None) => Some(TransportCommand::Quit),
        _ => None,
    }
}

/// Parse `SS`, `SS.s` or `MM:SS` into seconds.
fn parse_time(input: &str) -> Option<f64> {
    match input.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u64 = minutes.parse().ok()?;
            let seconds: f64 = seconds.parse().ok()?;
            (seconds >= 0.0 && seconds < 60.0).then(|| minutes as f64 * 60.0 + seconds)
        }
        None => input.parse::<f64>().ok().filter(|t| t.is_finite() && *t >= 0.0),
    }
}

fn print_help() {
    println!(
        "{}",
        style("Enter: play/pause | s <MM:SS> seek | j <n> jump to line | x stop | l list | q quit").dim()
    );
}

fn print_transcript(session: &PodcastSession, selected: Option<usize>) {
    for (i, segment) in session.segments().iter().enumerate() {
        Output::segment(i, segment, session.durations().get(&segment.id), selected == Some(i));
    }
}

/// Run the play command.
pub async fn run_play(source: &str, silent: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Play { silent }, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'castline doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let script = read_script(source)?;
    let tick = Duration::from_millis(settings.playback.tick_millis);
    let epsilon = settings.playback.seek_epsilon_secs;
    let ffplay = settings.playback.ffplay_path.clone();

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

    if let Some(banner) = &result.banner {
        Output::warning(banner);
    }

    let (output, mut events) = if silent {
        ClockOutput::new(tick)
    } else {
        ClockOutput::with_sink(tick, FfplaySink::new(&ffplay))
    };
    let mut controller = PlaybackController::new(output, epsilon);

    Output::header("Castline Player");
    print_transcript(&session, None);
    println!();
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_selected = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let (segments, durations) = session.playback_parts();

                match parse_command(line.trim()) {
                    Some(TransportCommand::Toggle) => controller.toggle(segments, durations),
                    Some(TransportCommand::Seek(t)) => controller.seek(segments, durations, t),
                    Some(TransportCommand::Jump(i)) => {
                        if !controller.play_segment(segments, durations, i, 0.0) {
                            Output::warning(&format!("Line {} has no playable audio.", i + 1));
                        }
                    }
                    Some(TransportCommand::Stop) => controller.stop(),
                    Some(TransportCommand::List) => {
                        print_transcript(&session, controller.state().selected());
                    }
                    Some(TransportCommand::Help) => print_help(),
                    Some(TransportCommand::Quit) => break,
                    None => Output::warning("Unknown command. Type 'h' for help."),
                }
            }
            Some(event) = events.recv() => {
                let (segments, durations) = session.playback_parts();
                controller.handle_event(segments, durations, event);
            }
        }

        let snapshot = controller.snapshot(session.segments(), session.durations());
        if snapshot.state.selected() != last_selected {
            last_selected = snapshot.state.selected();
            if let Some(i) = last_selected {
                let segment = &session.segments()[i];
                println!(
                    "\n{} {}",
                    style(format!("{}:", segment.speaker)).bold(),
                    segment.cleaned_text
                );
            }
        }
        print!("\r{}   ", Output::transport(&snapshot));
        std::io::stdout().flush()?;
    }

    controller.stop();
    println!();
    Output::info("Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command(""), Some(TransportCommand::Toggle));
        assert_eq!(parse_command("P"), Some(TransportCommand::Toggle));
        assert_eq!(parse_command("s 1:30"), Some(TransportCommand::Seek(90.0)));
        assert_eq!(parse_command("seek 12.5"), Some(TransportCommand::Seek(12.5)));
        assert_eq!(parse_command("j 3"), Some(TransportCommand::Jump(2)));
        assert_eq!(parse_command("j 0"), None);
        assert_eq!(parse_command("q"), Some(TransportCommand::Quit));
        assert_eq!(parse_command("dance"), None);
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("0"), Some(0.0));
        assert_eq!(parse_time("02:05"), Some(125.0));
        assert_eq!(parse_time("1:75"), None);
        assert_eq!(parse_time("-4"), None);
        assert_eq!(parse_time("abc"), None);
    }
}
