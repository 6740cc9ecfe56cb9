use thiserror::Error;

/// Why the external document producer did not deliver a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{command} failed ({status}): {output}")]
pub struct ParserDiagnostic {
    /// The command that was (last) attempted.
    pub command: String,
    /// Human readable completion status, e.g. `exit code 2` or `command not found`.
    pub status: String,
    /// Captured stderr, or stdout when stderr was empty.
    pub output: String,
}

impl ParserDiagnostic {
    pub fn new(command: impl Into<String>, status: impl Into<String>, output: impl Into<String>) -> Self {
        Self { command: command.into(), status: status.into(), output: output.into() }
    }
}

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Invalid upload: {0}")]
    Validation(String),
    #[error("Upload exceeds the limit of {limit} bytes")]
    TooLarge { limit: usize },
    #[error("No data yet. Upload an .xlsx first.")]
    NotReady,
    #[error("Parser error: {0}")]
    Parser(#[from] ParserDiagnostic),
    #[error("Data corruption: {message}")]
    DataCorruption { message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BoardError>;

impl BoardError {
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::DataCorruption { message: message.into() }
    }

    /// Expected conditions that are not system faults.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::TooLarge { .. } | Self::NotReady)
    }
}

// Helper conversions
impl From<config::ConfigError> for BoardError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}

impl From<tempfile::PersistError> for BoardError {
    fn from(e: tempfile::PersistError) -> Self { Self::Io(e.error) }
}

impl From<tempfile::PathPersistError> for BoardError {
    fn from(e: tempfile::PathPersistError) -> Self { Self::Io(e.error) }
}
