use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{} does not exist", .0.display())]
    ConfigMissing(PathBuf),

    #[error("{} is invalid: {reason}", .path.display())]
    ConfigCorrupt { path: PathBuf, reason: String },

    #[error("Missing required settings: {}", .0.join(", "))]
    ConfigIncomplete(Vec<String>),

    /// Cannot determine the platform configuration directory.
    #[error("Cannot determine configuration directory")]
    NoConfigDir,

    #[error("Failed to write {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    /// Transport-level failure (DNS, refused connection, timeout).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success status, carrying the remote's status line.
    #[error("{0}")]
    Remote(String),

    #[error("Unexpected response from {method}: {reason}")]
    MalformedResponse { method: String, reason: String },
}

impl Error {
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::ConfigMissing(_) | Error::ConfigCorrupt { .. } | Error::ConfigIncomplete(_)
        )
    }
}
