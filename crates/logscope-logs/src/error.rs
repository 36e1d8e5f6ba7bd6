use std::path::PathBuf;

use thiserror::Error;

use logscope_source::SourceError;

/// Failure to load a log file into the store
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to load {name}: {source}")]
    Fetch {
        name: String,
        #[source]
        source: SourceError,
    },
}

impl LoadError {
    pub fn file_name(&self) -> &str {
        match self {
            Self::Fetch { name, .. } => name,
        }
    }
}

/// Failure to export the displayed view
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export")]
    Empty,

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
