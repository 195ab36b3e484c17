//! Input resolution for CLI commands.
//!
//! Supports three input sources:
//! - Inline JSON string via `--input` / `-i`
//! - JSON file via `--input-file` / `-f`
//! - Stdin via `--input-file -`

use std::io::Read;
use std::path::Path;

use serde_json::Value;

/// Resolves the final JSON input from CLI arguments.
///
/// Priority: `--input-file` takes precedence over `--input`.
/// If `input_file` is `Some("-")`, reads from stdin.
pub fn resolve_input(input: &str, input_file: Option<&str>) -> anyhow::Result<Value> {
    let raw = match input_file {
        Some("-") => read_from_stdin()?,
        Some(path) => read_from_file(path)?,
        None => input.to_string(),
    };
    parse_json(raw.trim())
}

/// Reads and parses a JSON file.
pub fn read_json_file(path: &str) -> anyhow::Result<Value> {
    parse_json(read_from_file(path)?.trim())
}

fn read_from_file(path: &str) -> anyhow::Result<String> {
    let file_path = Path::new(path);
    if !file_path.exists() {
        anyhow::bail!("input file not found: {path}");
    }
    std::fs::read_to_string(file_path)
        .map_err(|e| anyhow::anyhow!("failed to read input file: {e}"))
}

fn read_from_stdin() -> anyhow::Result<String> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| anyhow::anyhow!("failed to read stdin: {e}"))?;
    Ok(buffer)
}

fn parse_json(input: &str) -> anyhow::Result<Value> {
    serde_json::from_str(input).map_err(|e| anyhow::anyhow!("invalid JSON input: {e}"))
}
