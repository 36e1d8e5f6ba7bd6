//! In-memory log source for tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::StreamExt;

use logscope_source::{LineStream, LogSource, SourceError};
use logscope_types::{LevelFilter, LogFileInfo};

type StreamRequest = (Option<String>, Option<LevelFilter>);

/// Source replaying a fixed script of lines
#[derive(Clone, Default)]
pub struct ScriptedSource {
    lines: Vec<String>,
    files: HashMap<String, String>,
    fail: bool,
    hang: bool,
    requests: Arc<Mutex<Vec<StreamRequest>>>,
}

impl ScriptedSource {
    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Stream that never yields
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    /// End the stream with a transport error after the scripted lines
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_file(mut self, name: &str, content: &str) -> Self {
        self.files.insert(name.to_string(), content.to_string());
        self
    }

    pub fn last_request(&self) -> Option<StreamRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl LogSource for ScriptedSource {
    async fn list_files(&self) -> Result<Vec<LogFileInfo>, SourceError> {
        let mut names: Vec<_> = self.files.keys().cloned().collect();
        names.sort();
        Ok(names
            .into_iter()
            .map(|name| {
                let size = self.files[&name].len() as u64;
                LogFileInfo::new(name, size, chrono::Utc::now())
            })
            .collect())
    }

    async fn fetch_file_content(&self, name: &str) -> Result<String, SourceError> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(name.to_string()))
    }

    fn open_log_stream(&self, file: Option<&str>, level: Option<LevelFilter>) -> LineStream {
        self.requests
            .lock()
            .unwrap()
            .push((file.map(str::to_string), level));

        if self.hang {
            return futures::stream::pending().boxed();
        }
        let mut items: Vec<Result<String, SourceError>> =
            self.lines.iter().cloned().map(Ok).collect();
        if self.fail {
            items.push(Err(SourceError::Transport("connection reset".to_string())));
        }
        futures::stream::iter(items).boxed()
    }
}
