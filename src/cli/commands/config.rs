//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Run the config command.
pub fn run_config(action: &ConfigAction, config_path: Option<PathBuf>, settings: Settings) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Edit => {
            if !config_path.exists() {
                settings.save_to(&config_path)?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    report(&config_path);
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Check => {
            if !config_path.exists() {
                Output::info(&format!("No config at {:?}; defaults apply.", config_path));
                return Ok(());
            }
            if !report(&config_path) {
                anyhow::bail!("Config at {:?} needs attention", config_path);
            }
        }
    }

    Ok(())
}

/// Re-read the file the way startup does and list what is wrong with it.
fn check_file(path: &Path) -> Result<Vec<String>> {
    let settings = Settings::load_from(Some(&path.to_path_buf()))
        .with_context(|| format!("Config at {:?} no longer parses", path))?;
    Ok(settings.validate())
}

/// Print the outcome of [`check_file`]. Returns true when the file is usable.
fn report(path: &Path) -> bool {
    match check_file(path) {
        Ok(problems) if problems.is_empty() => {
            Output::success(&format!("Config at {:?} is valid.", path));
            true
        }
        Ok(problems) => {
            for problem in &problems {
                Output::warning(problem);
            }
            false
        }
        Err(e) => {
            Output::error(&format!("{:#}", e));
            Output::info("The next run will fail until the file is fixed.");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_file_accepts_saved_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Settings::default().save_to(&path).unwrap();

        assert!(check_file(&path).unwrap().is_empty());
    }

    #[test]
    fn test_check_file_rejects_broken_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tts\nprovider = google").unwrap();

        let err = check_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("no longer parses"));
    }

    #[test]
    fn test_check_file_lists_unusable_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[synthesis]\nmax_concurrent = 0\n").unwrap();

        let problems = check_file(&path).unwrap();
        assert_eq!(problems, vec!["synthesis.max_concurrent must be at least 1".to_string()]);
    }
}
