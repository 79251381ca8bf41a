//! Parse command implementation.

use crate::cli::{read_script, Output};
use crate::script::{parse_script_checked, ScriptSource};
use anyhow::Result;

/// Run the parse command.
pub fn run_parse(source: &str, json: bool) -> Result<()> {
    let script = read_script(source)?;

    let text = match ScriptSource::classify(&script).into_script() {
        Ok(text) => text,
        Err(e) => {
            Output::error(&e.to_string());
            return Err(e.into());
        }
    };

    let lines = match parse_script_checked(text) {
        Ok(lines) => lines,
        Err(e) => {
            Output::error(&e.to_string());
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }

    Output::header(&format!("{} segments", lines.len()));
    for (i, line) in lines.iter().enumerate() {
        if line.is_cue() {
            println!("  {:>3} {:<5} ({})", i + 1, line.speaker.to_string(), line.raw_text.trim());
        } else {
            println!("  {:>3} {:<5} {}", i + 1, line.speaker.to_string(), line.cleaned_text);
        }
    }

    Ok(())
}
