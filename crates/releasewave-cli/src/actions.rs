//! GitHub Actions workflow commands: secret masking and step outputs.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// True when running inside a GitHub Actions job.
pub fn in_actions(github_actions: Option<&str>) -> bool {
    github_actions == Some("true")
}

/// `::add-mask::` line for one secret, one per line of a multi-line value.
pub fn mask_commands(secret: &str) -> Vec<String> {
    secret
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| format!("::add-mask::{}", l))
        .collect()
}

/// `name<<delimiter` form, which carries multi-line values safely.
pub fn format_output(name: &str, value: &str, delimiter: &str) -> String {
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

fn fresh_delimiter() -> String {
    format!("ghadelimiter_{}", uuid::Uuid::new_v4())
}

/// Step outputs, written to `$GITHUB_OUTPUT` when set and to stdout otherwise.
pub struct StepOutputs<'a> {
    file: Option<&'a Path>,
}

impl<'a> StepOutputs<'a> {
    pub fn new(file: Option<&'a Path>) -> Self {
        Self { file }
    }

    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        let mut delimiter = fresh_delimiter();
        while value.contains(&delimiter) {
            delimiter = fresh_delimiter();
        }
        let entry = format_output(name, value, &delimiter);

        match self.file {
            Some(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("open {}", path.display()))?;
                file.write_all(entry.as_bytes())
                    .with_context(|| format!("write output {} to {}", name, path.display()))?;
            }
            None => print!("{}", entry),
        }
        Ok(())
    }
}
