use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the energy monitor.
#[derive(Error, Debug)]
pub enum EnergyError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The shape of the input is wrong: unrecognised filename, bad header,
    /// wrong column or row count, dates out of order.
    #[error("Format error: {0}")]
    Format(String),

    /// A value could not be coerced to the expected type.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A date or date range lies outside what the loaded data supports.
    #[error("Range error: {0}")]
    Range(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A persisted JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse error category, used by callers that branch on the kind of failure
/// rather than its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Format,
    Parse,
    Range,
    Config,
}

impl EnergyError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EnergyError::FileRead { .. } | EnergyError::Io(_) => ErrorKind::Io,
            EnergyError::Format(_) => ErrorKind::Format,
            EnergyError::Parse(_) => ErrorKind::Parse,
            EnergyError::Range(_) => ErrorKind::Range,
            EnergyError::Config(_) | EnergyError::JsonParse(_) => ErrorKind::Config,
        }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        EnergyError::Format(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        EnergyError::Parse(msg.into())
    }

    pub fn range(msg: impl Into<String>) -> Self {
        EnergyError::Range(msg.into())
    }
}

/// Convenience alias used throughout the energy crates.
pub type Result<T> = std::result::Result<T, EnergyError>;
