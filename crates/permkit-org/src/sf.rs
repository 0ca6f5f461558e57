//! Running the `sf` CLI and reading its JSON envelope.

use crate::{OrgError, OrgResult};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::process::Command;
use tracing::debug;

/// Environment variable overriding the `sf` executable.
pub const SF_BIN_ENV: &str = "PERMKIT_SF_BIN";

/// Captured output of one `sf` invocation.
#[derive(Debug, Clone)]
pub struct SfOutput {
    /// Human-readable command line, for error messages
    pub command: String,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl SfOutput {
    /// Parse the `--json` envelope, preferring stdout and falling back to stderr.
    pub fn parse<T: DeserializeOwned>(&self) -> OrgResult<T> {
        parse_envelope(&self.command, &self.stdout, &self.stderr)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: i32,
    result: Option<T>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Path or name of the `sf` executable.
pub fn sf_program() -> String {
    std::env::var(SF_BIN_ENV)
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "sf".to_string())
}

/// Run `sf` with the given arguments and capture its output.
///
/// A non-zero exit is not an error here; the JSON envelope carries the details.
pub async fn run_sf(args: &[&str]) -> OrgResult<SfOutput> {
    let program = sf_program();
    let command = format!("{} {}", program, args.join(" "));
    debug!("Running {}", command);

    let output = Command::new(&program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| OrgError::Spawn {
            program: program.clone(),
            source,
        })?;

    Ok(SfOutput {
        command,
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

fn ansi_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("ANSI pattern is valid")
    })
}

/// Remove ANSI colour and cursor sequences.
pub fn strip_ansi(text: &str) -> String {
    ansi_pattern().replace_all(text, "").into_owned()
}

/// Parse an `sf --json` envelope from stdout, falling back to stderr.
pub fn parse_envelope<T: DeserializeOwned>(
    command: &str,
    stdout: &str,
    stderr: &str,
) -> OrgResult<T> {
    let mut first_error = None;

    for stream in [stdout, stderr] {
        let cleaned = strip_ansi(stream);
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            continue;
        }

        match serde_json::from_str::<Envelope<T>>(cleaned) {
            Ok(envelope) if envelope.status != 0 => {
                let message = envelope
                    .message
                    .or(envelope.name)
                    .unwrap_or_else(|| format!("exit status {}", envelope.status));
                return Err(OrgError::Cli {
                    command: command.to_string(),
                    message,
                });
            }
            Ok(envelope) => {
                return envelope.result.ok_or_else(|| OrgError::MissingResult {
                    command: command.to_string(),
                })
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(source) => Err(OrgError::Json {
            command: command.to_string(),
            message: source.to_string(),
            source,
        }),
        None => Err(OrgError::Cli {
            command: command.to_string(),
            message: "no output".to_string(),
        }),
    }
}
