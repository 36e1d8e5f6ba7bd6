//! Log file sources for logscope
//!
//! This crate provides the collaborator the log state engine reads from:
//! file listing, file contents, and a live stream of appended lines.

mod dir;
mod error;
mod follow;
mod source;

pub use dir::{DirSource, DEFAULT_TAIL_LIMIT};
pub use error::SourceError;
pub use follow::follow_file;
pub use source::{LineStream, LogSource};

// Re-export types used in our public API
pub use logscope_types::{LevelFilter, LogFileInfo};
