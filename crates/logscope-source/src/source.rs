use std::future::Future;

use futures::stream::BoxStream;
use logscope_types::{LevelFilter, LogFileInfo};

use crate::SourceError;

/// Stream of raw lines from a live subscription
///
/// The stream ends when the subscription closes; an `Err` item reports a
/// transport failure and is always the last item.
pub type LineStream = BoxStream<'static, Result<String, SourceError>>;

/// Where log files and live lines come from
pub trait LogSource: Clone + Send + Sync + 'static {
    /// List available log files
    fn list_files(&self) -> impl Future<Output = Result<Vec<LogFileInfo>, SourceError>> + Send;

    /// Fetch the full text of a log file
    fn fetch_file_content(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<String, SourceError>> + Send;

    /// Open a live stream of new lines, optionally scoped to a file and level
    fn open_log_stream(&self, file: Option<&str>, level: Option<LevelFilter>) -> LineStream;
}
