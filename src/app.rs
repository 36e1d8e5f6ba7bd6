use std::path::PathBuf;

use crossterm::event::KeyEvent;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use logscope_logs::{Session, StreamEvent};
use logscope_source::{LogSource, SourceError};
use logscope_tui::{Action, Focus, InputMode, KeyBindings, KeyContext, UiState};
use logscope_types::LogFileInfo;

/// Results of fetches running on spawned tasks
#[derive(Debug)]
pub enum InternalAction {
    FilesLoaded(Result<Vec<LogFileInfo>, SourceError>),
    FileLoaded {
        name: String,
        result: Result<String, SourceError>,
    },
}

/// Session plus terminal state, driven by actions from the event loop
pub struct App<S: LogSource> {
    pub session: Session,
    pub ui: UiState,
    source: S,
    export_dir: PathBuf,
    internal_tx: mpsc::UnboundedSender<InternalAction>,
    stream_tx: mpsc::UnboundedSender<StreamEvent>,
}

impl<S: LogSource> App<S> {
    pub fn new(
        session: Session,
        source: S,
        export_dir: PathBuf,
        internal_tx: mpsc::UnboundedSender<InternalAction>,
        stream_tx: mpsc::UnboundedSender<StreamEvent>,
    ) -> Self {
        Self {
            session,
            ui: UiState::new(),
            source,
            export_dir,
            internal_tx,
            stream_tx,
        }
    }

    /// Map a key press to an action for the current focus and input mode
    pub fn key_action(&self, keybindings: &KeyBindings, key: &KeyEvent) -> Option<Action> {
        if self.ui.is_editing() {
            return keybindings.get_input_action(key);
        }
        let context = match self.ui.focus {
            Focus::Files => KeyContext::FileList,
            Focus::Logs => KeyContext::LogPanel,
        };
        keybindings.get_action(context, key)
    }

    /// Apply the start options: list files, load a file, optionally go live
    ///
    /// The file is loaded before streaming starts so the stream follows it.
    /// A failed load only leaves an error status behind.
    pub async fn start(&mut self, file: Option<&str>, live: bool) {
        self.session.refresh_files(&self.source).await;
        self.ui.clamp_selection(self.session.files().len());
        if let Some(name) = file {
            if let Err(e) = self.session.load_file(&self.source, name).await {
                warn!(error = %e, "initial file load failed");
            }
        }
        if live {
            self.handle_action(Action::ToggleLive);
        }
    }

    /// Fetch the file list in the background
    pub fn refresh_files(&mut self) {
        self.session.begin_list_files();
        let source = self.source.clone();
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = source.list_files().await;
            let _ = tx.send(InternalAction::FilesLoaded(result));
        });
    }

    /// Fetch a file in the background
    pub fn load_file(&mut self, name: String) {
        self.session.begin_load(&name);
        let source = self.source.clone();
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch_file_content(&name).await;
            let _ = tx.send(InternalAction::FileLoaded { name, result });
        });
    }

    pub fn handle_internal(&mut self, action: InternalAction) {
        match action {
            InternalAction::FilesLoaded(result) => {
                self.session.finish_list_files(result);
                self.ui.clamp_selection(self.session.files().len());
            }
            InternalAction::FileLoaded { name, result } => {
                match self.session.finish_load(&name, result) {
                    Ok(()) => self.ui.reset_scroll(),
                    Err(e) => debug!(error = %e, "file load failed"),
                }
            }
        }
        self.ui.render_dirty = true;
    }

    pub fn handle_stream_event(&mut self, event: StreamEvent) {
        self.session.handle_stream_event(event);
        self.ui.render_dirty = true;
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => {
                self.session.stop_live();
                self.ui.should_quit = true;
            }
            Action::ToggleHelp => {
                self.ui.help_visible = !self.ui.help_visible;
            }
            Action::FocusNext => {
                self.ui.focus = self.ui.focus.next();
            }

            // File list
            Action::ListUp => {
                self.ui.list_up(self.session.files().len());
            }
            Action::ListDown => {
                self.ui.list_down(self.session.files().len());
            }
            Action::ListSelect => {
                let selected = self
                    .ui
                    .selected_index()
                    .and_then(|i| self.session.files().get(i))
                    .map(|f| f.name.clone());
                if let Some(name) = selected {
                    self.load_file(name);
                }
            }
            Action::RefreshFiles => {
                self.refresh_files();
            }

            // Log panel
            Action::ScrollUp(n) => self.ui.scroll_up(n),
            Action::ScrollDown(n) => self.ui.scroll_down(n),
            Action::PageUp => self.ui.scroll_up(20),
            Action::PageDown => self.ui.scroll_down(20),
            Action::ScrollToTop => self.ui.scroll_to_top(),
            Action::ScrollToBottom => self.ui.scroll_to_bottom(),
            Action::ToggleFollow => {
                self.ui.follow = !self.ui.follow;
            }
            Action::ToggleStats => {
                self.ui.stats_visible = !self.ui.stats_visible;
            }

            // Viewer operations
            Action::ToggleLive => {
                self.session.toggle_live(&self.source, self.stream_tx.clone());
                self.ui.reset_scroll();
            }
            Action::CycleLevel | Action::CycleLevelBack => {
                let current = self.session.criteria().level;
                let level = if action == Action::CycleLevel {
                    current.next()
                } else {
                    current.prev()
                };
                self.session.set_level(level);
                // The subscription filters by level too, so resubscribe
                if self.session.is_live() {
                    self.session.start_live(&self.source, self.stream_tx.clone());
                }
            }
            Action::ClearDate => {
                self.session.set_date(None);
            }
            Action::ClearViewer => {
                self.session.clear();
                self.ui.reset_scroll();
            }
            Action::Export => {
                if let Err(e) = self.session.export_to(&self.export_dir) {
                    warn!(error = %e, "export failed");
                }
            }

            // Text input
            Action::OpenSearch => {
                let current = self.session.criteria().search.clone();
                self.ui.open_input(InputMode::Search, &current);
            }
            Action::OpenDateInput => {
                let current = self.session.criteria().date_string().unwrap_or_default();
                self.ui.open_input(InputMode::Date, &current);
            }
            Action::InputChar(c) => {
                self.ui.input_char(c);
                self.apply_search_input();
            }
            Action::InputBackspace => {
                self.ui.input_backspace();
                self.apply_search_input();
            }
            Action::InputClear => {
                self.ui.input_clear();
                self.apply_search_input();
            }
            Action::InputSubmit => self.submit_input(),
            Action::InputCancel => self.ui.close_input(),

            Action::Render => {}
        }
        self.ui.render_dirty = true;
    }

    /// Search narrows the view as the operator types
    fn apply_search_input(&mut self) {
        if self.ui.input_mode == InputMode::Search {
            self.session.set_search(self.ui.input.clone());
        }
    }

    fn submit_input(&mut self) {
        match self.ui.input_mode {
            InputMode::Search => {
                self.session.set_search(self.ui.input.clone());
                self.ui.close_input();
            }
            InputMode::Date => match self.ui.parse_date_input() {
                Ok(date) => {
                    self.session.set_date(date);
                    self.ui.close_input();
                    self.ui.reset_scroll();
                }
                Err(msg) => self.ui.input_error = Some(msg),
            },
            InputMode::Normal => {}
        }
    }
}
