use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use logscope_source::{LogSource, SourceError};
use logscope_types::{FilterCriteria, LevelFilter, LogFileInfo, LogLine, StatusMessage, StoreMode};

use crate::export::Export;
use crate::store::LogStore;
use crate::stream::{LiveStreamController, StreamEvent, StreamState};
use crate::view::{project, LineCounter, ProjectionBranch};
use crate::{ExportError, LoadError};

/// All viewer state for one session
///
/// Owns the store, the current criteria and the live controller. Every
/// mutation goes through a method here; the displayed view is derived on
/// demand and never cached.
pub struct Session {
    store: LogStore,
    criteria: FilterCriteria,
    controller: LiveStreamController,

    /// Files offered by the source
    files: Vec<LogFileInfo>,

    /// Last status line
    status: StatusMessage,

    /// File whose fetch is in flight; older responses are dropped
    pending_load: Option<String>,
}

impl Session {
    pub fn new(store: LogStore, controller: LiveStreamController) -> Self {
        Self {
            store,
            criteria: FilterCriteria::default(),
            controller,
            files: Vec::new(),
            status: StatusMessage::default(),
            pending_load: None,
        }
    }

    // ------------------------------------------------------------------
    // File listing
    // ------------------------------------------------------------------

    pub fn begin_list_files(&mut self) {
        self.status = StatusMessage::info("Loading log files...");
    }

    pub fn finish_list_files(&mut self, result: Result<Vec<LogFileInfo>, SourceError>) {
        match result {
            Ok(files) => {
                debug!(count = files.len(), "log files listed");
                self.files = files;
                self.status = StatusMessage::info("Log files loaded");
            }
            Err(e) => {
                warn!(error = %e, "failed to list log files");
                self.status = StatusMessage::error("Error loading log files");
            }
        }
    }

    /// List files from a source in one step
    pub async fn refresh_files<S: LogSource>(&mut self, source: &S) {
        self.begin_list_files();
        let result = source.list_files().await;
        self.finish_list_files(result);
    }

    // ------------------------------------------------------------------
    // File loading
    // ------------------------------------------------------------------

    /// Mark a file fetch as in flight
    pub fn begin_load(&mut self, name: &str) {
        self.pending_load = Some(name.to_string());
        self.status = StatusMessage::info(format!("Loading {}...", name));
    }

    /// Apply a finished fetch
    ///
    /// Responses for anything but the most recent request are ignored. On
    /// failure the store keeps its previous contents.
    pub fn finish_load(
        &mut self,
        name: &str,
        result: Result<String, SourceError>,
    ) -> Result<(), LoadError> {
        if self.pending_load.as_deref() != Some(name) {
            debug!(file = name, "ignoring superseded file load");
            return Ok(());
        }
        self.pending_load = None;

        match result {
            Ok(text) => {
                // A new file resets live mode, so the old subscription goes too
                self.controller.stop();
                self.store.load_file(name, &text);
                self.redraw();
                info!(file = name, lines = self.store.static_lines().len(), "loaded log file");
                self.status = StatusMessage::success(format!("{} loaded", name));
                Ok(())
            }
            Err(source) => {
                warn!(file = name, error = %source, "failed to load log file");
                self.status = StatusMessage::error(format!("Error loading {}", name));
                Err(LoadError::Fetch {
                    name: name.to_string(),
                    source,
                })
            }
        }
    }

    /// Fetch and load a file in one step
    pub async fn load_file<S: LogSource>(&mut self, source: &S, name: &str) -> Result<(), LoadError> {
        self.begin_load(name);
        let result = source.fetch_file_content(name).await;
        self.finish_load(name, result)
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    /// Replace the criteria wholesale
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        // Live filtering narrows the screen without redrawing the counter
        if self.store.mode() == StoreMode::Static {
            self.redraw();
        }
    }

    pub fn set_level(&mut self, level: LevelFilter) {
        self.set_criteria(self.criteria.with_level(level));
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.set_criteria(self.criteria.with_search(search));
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.set_criteria(self.criteria.with_date(date));
    }

    // ------------------------------------------------------------------
    // Live mode
    // ------------------------------------------------------------------

    /// Subscribe to the live stream for the active file and level
    pub fn start_live<S: LogSource>(
        &mut self,
        source: &S,
        event_tx: mpsc::UnboundedSender<StreamEvent>,
    ) {
        let level = self.criteria.level;
        self.controller
            .start(source, self.store.active_file(), Some(level), event_tx);
        self.store.set_mode(StoreMode::Live);
        let target = self.store.active_file().unwrap_or("default log");
        self.status = StatusMessage::info(format!("Streaming {}", target));
    }

    /// Close the subscription and go back to the static set
    pub fn stop_live(&mut self) {
        self.controller.stop();
        self.store.set_mode(StoreMode::Static);
        self.redraw();
        self.status = StatusMessage::info("Live stream stopped");
    }

    /// Stop when streaming, otherwise (re)start
    pub fn toggle_live<S: LogSource>(
        &mut self,
        source: &S,
        event_tx: mpsc::UnboundedSender<StreamEvent>,
    ) {
        if self.controller.is_active() {
            self.stop_live();
        } else {
            self.start_live(source, event_tx);
        }
    }

    /// Apply an event from the stream task
    pub fn handle_stream_event(&mut self, event: StreamEvent) {
        if let Some(status) = self.controller.handle_event(event, &mut self.store) {
            self.status = status;
        }
    }

    // ------------------------------------------------------------------
    // Clear / export
    // ------------------------------------------------------------------

    /// Reset the viewer to its initial state
    pub fn clear(&mut self) {
        self.controller.stop();
        self.store.clear();
        self.pending_load = None;
        self.controller.counter_mut().reset_to(0);
        self.status = StatusMessage::info("Log viewer cleared");
    }

    /// Serialize the current view
    pub fn export(&self) -> Result<Export, ExportError> {
        Export::from_view(self.store.active_file(), &self.view())
    }

    /// Write the current view into a directory
    pub fn export_to(&mut self, dir: &Path) -> Result<PathBuf, ExportError> {
        let result = self.export().and_then(|export| {
            let count = export.line_count;
            export.write_to(dir).map(|path| (path, count))
        });
        match result {
            Ok((path, count)) => {
                self.status =
                    StatusMessage::success(format!("Exported {} lines to {}", count, path.display()));
                Ok(path)
            }
            Err(e) => {
                self.status = StatusMessage::error(format!("Export failed: {}", e));
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The displayed lines for the current state
    pub fn view(&self) -> Vec<&LogLine> {
        project(&self.store, &self.criteria)
    }

    pub fn branch(&self) -> ProjectionBranch {
        ProjectionBranch::select(&self.store, &self.criteria)
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn files(&self) -> &[LogFileInfo] {
        &self.files
    }

    pub fn status(&self) -> &StatusMessage {
        &self.status
    }

    pub fn set_status(&mut self, status: StatusMessage) {
        self.status = status;
    }

    pub fn stream_state(&self) -> StreamState {
        self.controller.state()
    }

    pub fn is_live(&self) -> bool {
        self.controller.is_active()
    }

    pub fn line_counter(&self) -> LineCounter {
        self.controller.counter()
    }

    pub fn pending_load(&self) -> Option<&str> {
        self.pending_load.as_deref()
    }

    /// Reset the counter to the freshly drawn view
    fn redraw(&mut self) {
        let count = self.view().len();
        self.controller.counter_mut().reset_to(count);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(LogStore::new(), LiveStreamController::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSource;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn drain_into(session: &mut Session, rx: &mut mpsc::UnboundedReceiver<StreamEvent>, n: usize) {
        for _ in 0..n {
            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            session.handle_stream_event(event);
        }
    }

    fn raws(session: &Session) -> Vec<String> {
        session.view().iter().map(|l| l.raw().to_string()).collect()
    }

    #[tokio::test]
    async fn test_load_and_filter() {
        let source =
            ScriptedSource::default().with_file("app.log", "[INFO] a\n[ERROR] b\n\n[ERROR] c\n");
        let mut session = Session::default();

        session.load_file(&source, "app.log").await.unwrap();
        assert_eq!(session.status().text, "app.log loaded");
        assert_eq!(session.line_counter().get(), 3);

        session.set_level(LevelFilter::Error);
        assert_eq!(raws(&session), vec!["[ERROR] b", "[ERROR] c"]);
        assert_eq!(session.line_counter().get(), 2);

        session.set_search("C");
        assert_eq!(raws(&session), vec!["[ERROR] c"]);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_state() {
        let source = ScriptedSource::default().with_file("app.log", "[INFO] a");
        let mut session = Session::default();
        session.load_file(&source, "app.log").await.unwrap();

        let err = session.load_file(&source, "missing.log").await.unwrap_err();
        assert_eq!(err.file_name(), "missing.log");
        assert!(session.status().is_error());
        assert_eq!(session.status().text, "Error loading missing.log");
        assert_eq!(session.store().active_file(), Some("app.log"));
        assert_eq!(raws(&session), vec!["[INFO] a"]);
    }

    #[test]
    fn test_superseded_load_is_ignored() {
        let mut session = Session::default();
        session.begin_load("first.log");
        session.begin_load("second.log");

        session
            .finish_load("first.log", Ok("[INFO] stale".to_string()))
            .unwrap();
        assert_eq!(session.store().active_file(), None);
        assert_eq!(session.pending_load(), Some("second.log"));

        session
            .finish_load("second.log", Ok("[INFO] fresh".to_string()))
            .unwrap();
        assert_eq!(raws(&session), vec!["[INFO] fresh"]);
    }

    #[tokio::test]
    async fn test_live_round_trip_keeps_static_set() {
        let source = ScriptedSource::lines(["[INFO] live 1", "[WARN] live 2"])
            .with_file("app.log", "[INFO] static");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = Session::default();
        session.load_file(&source, "app.log").await.unwrap();

        session.toggle_live(&source, tx.clone());
        assert!(session.is_live());
        assert_eq!(session.store().mode(), StoreMode::Live);
        drain_into(&mut session, &mut rx, 2).await;
        assert_eq!(raws(&session), vec!["[WARN] live 2", "[INFO] live 1"]);
        // Counter continues from the static count
        assert_eq!(session.line_counter().get(), 3);

        session.toggle_live(&source, tx);
        assert!(!session.is_live());
        assert_eq!(session.stream_state(), StreamState::Idle);
        assert_eq!(raws(&session), vec!["[INFO] static"]);
        assert_eq!(session.store().live_len(), 2);
    }

    #[tokio::test]
    async fn test_stream_failure_surfaces_status() {
        let source = ScriptedSource::lines(["[INFO] one"]).failing();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = Session::default();

        session.start_live(&source, tx);
        drain_into(&mut session, &mut rx, 2).await;
        assert_eq!(session.stream_state(), StreamState::Idle);
        assert!(session.status().is_error());
        // Retained live lines stay visible until the operator acts
        assert_eq!(raws(&session), vec!["[INFO] one"]);
    }

    #[tokio::test]
    async fn test_loading_file_stops_stream() {
        let source = ScriptedSource::hanging().with_file("b.log", "[INFO] b");
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = Session::default();

        session.start_live(&source, tx);
        assert!(session.is_live());

        session.load_file(&source, "b.log").await.unwrap();
        assert!(!session.is_live());
        assert_eq!(session.store().mode(), StoreMode::Static);
        assert_eq!(session.store().live_len(), 0);
    }

    #[tokio::test]
    async fn test_start_live_passes_file_and_level() {
        let source = ScriptedSource::hanging().with_file("app.log", "[INFO] a");
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = Session::default();
        session.load_file(&source, "app.log").await.unwrap();
        session.set_level(LevelFilter::Warn);

        session.start_live(&source, tx);
        assert_eq!(
            source.last_request(),
            Some((Some("app.log".to_string()), Some(LevelFilter::Warn)))
        );
        session.stop_live();
    }

    #[tokio::test]
    async fn test_date_filter_overrides_level() {
        let source = ScriptedSource::default().with_file(
            "app.log",
            "2025-08-03 [INFO] boot\n2025-08-04 [ERROR] crash\n",
        );
        let mut session = Session::default();
        session.load_file(&source, "app.log").await.unwrap();
        session.set_level(LevelFilter::Error);
        session.set_date(NaiveDate::from_ymd_opt(2025, 8, 3));

        assert_eq!(session.branch(), ProjectionBranch::Date);
        assert_eq!(raws(&session), vec!["2025-08-03 [INFO] boot"]);

        session.set_date(None);
        assert_eq!(raws(&session), vec!["2025-08-04 [ERROR] crash"]);
    }

    #[tokio::test]
    async fn test_clear_resets_everything() {
        let source = ScriptedSource::hanging().with_file("app.log", "[INFO] a");
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = Session::default();
        session.load_file(&source, "app.log").await.unwrap();
        session.start_live(&source, tx);

        session.clear();
        assert!(!session.is_live());
        assert!(session.store().is_empty());
        assert_eq!(session.store().active_file(), None);
        assert_eq!(session.line_counter().get(), 0);
        assert_eq!(session.status().text, "Log viewer cleared");
    }

    #[tokio::test]
    async fn test_export() {
        let dir = TempDir::new().unwrap();
        let source = ScriptedSource::default().with_file("app.log", "[INFO] a\n[ERROR] b\n");
        let mut session = Session::default();

        assert!(matches!(session.export_to(dir.path()), Err(ExportError::Empty)));
        assert!(session.status().is_error());

        session.load_file(&source, "app.log").await.unwrap();
        session.set_level(LevelFilter::Error);
        let path = session.export_to(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("app_filtered.log"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[ERROR] b");
    }

    #[tokio::test]
    async fn test_refresh_files() {
        let source = ScriptedSource::default()
            .with_file("b.log", "x")
            .with_file("a.log", "y");
        let mut session = Session::default();
        session.refresh_files(&source).await;
        let names: Vec<_> = session.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.log", "b.log"]);
        assert_eq!(session.status().text, "Log files loaded");
    }
}
