use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by a log source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Log file not found: {0}")]
    NotFound(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Cannot follow compressed file: {0}")]
    Compressed(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl SourceError {
    /// Map an IO error for a named file, keeping not-found distinct
    pub(crate) fn for_file(name: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(name.to_string())
        } else {
            Self::Io(err)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
