//! Castline CLI entry point.

use anyhow::Result;
use castline::cli::{commands, Cli, Commands};
use castline::config::Settings;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let mut settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("castline={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    std::fs::create_dir_all(settings.temp_dir())?;

    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Parse { script, json } => {
            commands::run_parse(script, *json)?;
        }

        Commands::Synthesize { script, output, format, provider } => {
            if let Some(provider) = provider {
                settings.tts.provider = provider.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            }
            commands::run_synthesize(script, output, format, settings).await?;
        }

        Commands::Play { script, silent, provider } => {
            if let Some(provider) = provider {
                settings.tts.provider = provider.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            }
            commands::run_play(script, *silent, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
