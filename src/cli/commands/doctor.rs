//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{Settings, TtsProvider};
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Castline Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    let tools = [
        check_tool("ffprobe", &settings.probe.ffprobe_path, true),
        check_tool("ffplay", &settings.playback.ffplay_path, false),
    ];
    for check in &tools {
        check.print();
    }
    checks.extend(tools);

    println!();

    println!("{}", style("Speech Synthesis").bold());
    let key_check = check_api_key(settings);
    key_check.print();
    checks.push(key_check);
    Output::kv("provider", &settings.tts.provider.to_string());
    if settings.tts.provider == TtsProvider::OpenAi {
        Output::kv("model", &settings.tts.openai_model);
    } else {
        Output::kv("language", &settings.tts.language_code);
    }

    println!();

    println!("{}", style("Directories").bold());
    let dir_check = check_clip_dir(settings);
    dir_check.print();
    checks.push(dir_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Castline.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Castline is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available. Optional tools only warn.
fn check_tool(name: &str, binary: &str, required: bool) -> CheckResult {
    let hint = install_hint_ffmpeg();
    match Command::new(binary).arg("-version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                CheckResult::error(name, "not found", hint)
            } else {
                CheckResult::warning(name, "not found (play --silent still works)", hint)
            }
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check the API key for the configured provider.
fn check_api_key(settings: &Settings) -> CheckResult {
    let env = settings.tts.provider.api_key_env();
    let hint = format!("Set with: export {}='...' (or tts.api_key in the config file)", env);

    match settings.tts.resolve_api_key() {
        Some(key) if key.chars().count() >= 20 => {
            CheckResult::ok(env, &format!("configured ({})", mask_key(&key)))
        }
        Some(_) => CheckResult::error(env, "too short to be valid", &hint),
        None => CheckResult::error(env, "not set", &hint),
    }
}

/// Show only the ends of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check the clip directory.
fn check_clip_dir(settings: &Settings) -> CheckResult {
    let dir = settings.temp_dir();
    if dir.exists() {
        CheckResult::ok("Clip directory", &format!("{}", dir.display()))
    } else {
        CheckResult::warning(
            "Clip directory",
            &format!("{} (will be created)", dir.display()),
            "Directory will be created on first use",
        )
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning("Config file", "using defaults", "Create with: castline config edit")
    }
}

/// Platform-specific install hint for ffmpeg tools.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_missing_optional_tool_only_warns() {
        let result = check_tool("ffplay", "castline-no-such-ffplay", false);
        assert_eq!(result.status, CheckStatus::Warning);

        let result = check_tool("ffprobe", "castline-no-such-ffprobe", true);
        assert_eq!(result.status, CheckStatus::Error);
    }

    #[test]
    fn test_api_key_check() {
        let mut settings = Settings::default();
        settings.tts.api_key = Some("AIzaSyExampleExampleExample".to_string());
        let result = check_api_key(&settings);
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.message.contains("AIza...mple"));

        settings.tts.api_key = Some("short".to_string());
        assert_eq!(check_api_key(&settings).status, CheckStatus::Error);
    }
}
