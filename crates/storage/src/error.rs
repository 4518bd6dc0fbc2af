use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("An error occurred during JSON serialization: {0}")]
    Json(#[from] serde_json::Error),

    #[error("History of agent '{agent_id}' is corrupt: {reason}")]
    CorruptHistory { agent_id: String, reason: String },

    #[error("No history found for agent '{0}'")]
    MissingAgentData(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StorageError::Io { path, source }
    }
}
