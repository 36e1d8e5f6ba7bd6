//! Log state engine for logscope
//!
//! This crate reconciles a static file snapshot with a live stream of lines,
//! applies filter criteria to both, and projects the displayed view.

mod classifier;
mod error;
mod export;
mod filter;
mod session;
mod store;
mod stream;
mod view;

#[cfg(test)]
mod testing;

pub use classifier::{classify, LineClassifier};
pub use error::{ExportError, LoadError};
pub use export::{export_file_name, Export, FALLBACK_EXPORT_NAME};
pub use filter::{matches, matches_date, LinePredicate};
pub use session::Session;
pub use store::{LogStore, SeverityCounts, LIVE_CAPACITY};
pub use stream::{LiveStreamController, StreamEvent, StreamEventKind, StreamState};
pub use view::{project, LineCounter, ProjectionBranch};

// Re-export types used in our public API
pub use logscope_types::{
    FilterCriteria, LevelFilter, LogFileInfo, LogLine, Severity, StatusKind, StatusMessage,
    StoreMode,
};
