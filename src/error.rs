#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid due date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("task {0} not found")]
    NotFound(u64),

    #[error(
        "task store {path} is corrupt: {reason}\nfix or move the file by hand; nothing was written"
    )]
    CorruptStore { path: PathBuf, reason: String },

    #[error("no task ids left to assign")]
    IdsExhausted,

    #[error("failed to serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("operation cancelled")]
    Cancelled,

    #[error("io error at {path}: {source}")]
    IoPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid config key '{0}'")]
    InvalidConfigKey(String),

    #[error("invalid config value for '{key}': {msg}")]
    InvalidConfigValue { key: String, msg: String },
}

impl TaskError {
    /// Process exit status the command layer reports for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::InvalidDate { .. } => 2,
            Self::NotFound(_) => 3,
            Self::CorruptStore { .. } => 4,
            _ => 1,
        }
    }
}
