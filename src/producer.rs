//! Turning a spreadsheet into the JSON document is delegated to a
//! [`DocumentProducer`]. The shipped implementation spawns an external
//! interpreter running the export parser script; anything else that can
//! write a document to a path (an in-process parser, a test double) plugs
//! in behind the same trait.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::ParserDiagnostic;

/// Environment variable that overrides the parser command.
pub const COMMAND_OVERRIDE_ENV: &str = "PYTHON";

#[async_trait]
pub trait DocumentProducer: Send + Sync {
    /// Reads the spreadsheet at `input` and writes a document to `output`.
    async fn parse(&self, input: &Path, output: &Path) -> Result<(), ParserDiagnostic>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Explicit command; wins over the platform default but not over the
    /// override environment variable.
    pub command: Option<String>,
    /// Tried once when the primary command is not found.
    pub fallback: Option<String>,
    /// Script passed as the first argument, if the command is an interpreter.
    pub script: Option<PathBuf>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            command: None,
            fallback: Some("python".into()),
            script: Some(PathBuf::from("server/scripts/parse_xlsx.py")),
        }
    }
}

/// Platform default interpreter name.
pub fn default_command() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

/// Runs `<command> [script] <input> <output>` as a child process.
#[derive(Debug, Clone)]
pub struct CommandProducer {
    command: String,
    fallback: Option<String>,
    script: Option<PathBuf>,
}

impl CommandProducer {
    pub fn new(command: impl Into<String>, fallback: Option<String>, script: Option<PathBuf>) -> Self {
        let command = command.into();
        // a fallback equal to the primary would just fail the same way
        let fallback = fallback.filter(|f| !f.trim().is_empty() && *f != command);
        Self { command, fallback, script }
    }

    /// Resolves the command from `override_value` (normally the
    /// [`COMMAND_OVERRIDE_ENV`] variable), then the config, then the platform
    /// default.
    pub fn from_config(config: &ParserConfig, override_value: Option<String>) -> Self {
        let command = override_value
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .or_else(|| config.command.clone().filter(|c| !c.trim().is_empty()))
            .unwrap_or_else(|| default_command().to_owned());
        Self::new(command, config.fallback.clone(), config.script.clone())
    }

    pub fn from_env(config: &ParserConfig) -> Self {
        Self::from_config(config, std::env::var(COMMAND_OVERRIDE_ENV).ok())
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    async fn run(&self, command: &str, input: &Path, output: &Path) -> io::Result<std::process::Output> {
        let mut cmd = Command::new(command);
        if let Some(script) = &self.script {
            cmd.arg(script);
        }
        cmd.arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd.output().await
    }
}

#[async_trait]
impl DocumentProducer for CommandProducer {
    async fn parse(&self, input: &Path, output: &Path) -> Result<(), ParserDiagnostic> {
        info!(command = %self.command, input = %input.display(), "running parser");
        let mut command = self.command.as_str();
        let mut outcome = self.run(command, input, output).await;
        let not_found = matches!(&outcome, Err(e) if e.kind() == io::ErrorKind::NotFound);
        if let (true, Some(fallback)) = (not_found, self.fallback.as_deref()) {
            warn!(primary = %self.command, fallback, "parser command not found, retrying with fallback");
            command = fallback;
            outcome = self.run(command, input, output).await;
        }
        let finished = outcome.map_err(|e| {
            let status = if e.kind() == io::ErrorKind::NotFound {
                "command not found".to_owned()
            } else {
                "could not start".to_owned()
            };
            ParserDiagnostic::new(command, status, e.to_string())
        })?;
        if finished.status.success() {
            info!(command, "parser finished");
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&finished.stderr).trim().to_owned();
        let text = if stderr.is_empty() {
            String::from_utf8_lossy(&finished.stdout).trim().to_owned()
        } else {
            stderr
        };
        let status = match finished.status.code() {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_owned(),
        };
        Err(ParserDiagnostic::new(command, status, text))
    }
}
