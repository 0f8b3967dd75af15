// Step outputs handed back to the pipeline runner.

use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const ARTIFACT_URL: &str = "artifact-url";
const OUTPUT_FILE_VAR: &str = "GITHUB_OUTPUT";

/// Publish `name=value` for later steps. Appends to the runner's output file
/// when one is configured, otherwise prints the pair on stdout.
pub fn set_output(name: &str, value: &str) -> Result<()> {
    match output_file() {
        Some(path) => append_output(&path, name, value),
        None => {
            println!("{}={}", name, value);
            Ok(())
        }
    }
}

/// The runner's output file, if one is configured.
pub fn output_file() -> Option<PathBuf> {
    std::env::var_os(OUTPUT_FILE_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

pub fn append_output(path: &Path, name: &str, value: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::filesystem("open", path, e))?;

    file.write_all(format_output(name, value).as_bytes())
        .map_err(|e| Error::filesystem("write", path, e))
}

/// Heredoc form `name<<DELIM\nvalue\nDELIM\n`, with a delimiter that never
/// appears in the value.
fn format_output(name: &str, value: &str) -> String {
    let mut delimiter = String::from("ghadelimiter");
    while value.contains(&delimiter) || name.contains(&delimiter) {
        delimiter.push('_');
    }
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}
