use chrono::NaiveDate;
use ratatui::widgets::ListState;

/// Which panel receives navigation keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Files,
    Logs,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Self::Files => Self::Logs,
            Self::Logs => Self::Files,
        }
    }
}

/// Text input currently capturing keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    Date,
}

/// UI-specific transient state
///
/// Everything about the logs themselves lives in the session; this only
/// tracks what the terminal shows and where the cursor is.
pub struct UiState {
    pub focus: Focus,

    pub input_mode: InputMode,

    /// Text being typed into the search or date field
    pub input: String,

    /// Rejected input message (e.g. malformed date)
    pub input_error: Option<String>,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Show severity counts bar?
    pub stats_visible: bool,

    /// Selection in the file list
    pub list_state: ListState,

    /// First visible row of the log panel
    pub log_scroll: usize,

    /// Keep the newest line in view
    pub follow: bool,

    pub should_quit: bool,

    /// Only render when true
    pub render_dirty: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: Focus::default(),
            input_mode: InputMode::Normal,
            input: String::new(),
            input_error: None,
            help_visible: false,
            stats_visible: false,
            list_state: ListState::default(),
            log_scroll: 0,
            follow: true,
            should_quit: false,
            render_dirty: true,
        }
    }
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // File list
    // ------------------------------------------------------------------

    /// Move selection up, wrapping at the top
    pub fn list_up(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    /// Move selection down, wrapping at the bottom
    pub fn list_down(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    /// Keep the selection inside a list that may have shrunk
    pub fn clamp_selection(&mut self, len: usize) {
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            None => self.list_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.list_state.selected()
    }

    // ------------------------------------------------------------------
    // Log panel
    // ------------------------------------------------------------------

    pub fn scroll_up(&mut self, n: usize) {
        self.follow = false;
        self.log_scroll = self.log_scroll.saturating_sub(n);
    }

    /// Scroll down; the renderer clamps to the real bottom
    pub fn scroll_down(&mut self, n: usize) {
        self.follow = false;
        self.log_scroll = self.log_scroll.saturating_add(n);
    }

    pub fn scroll_to_top(&mut self) {
        self.follow = false;
        self.log_scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow = false;
        self.log_scroll = usize::MAX;
    }

    /// Jump back to the newest line and keep following
    pub fn reset_scroll(&mut self) {
        self.log_scroll = 0;
        self.follow = true;
    }

    // ------------------------------------------------------------------
    // Text input
    // ------------------------------------------------------------------

    pub fn is_editing(&self) -> bool {
        self.input_mode != InputMode::Normal
    }

    /// Start editing, pre-filled with the current value
    pub fn open_input(&mut self, mode: InputMode, current: &str) {
        self.input_mode = mode;
        self.input = current.to_string();
        self.input_error = None;
    }

    pub fn close_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
        self.input_error = None;
    }

    pub fn input_char(&mut self, c: char) {
        self.input.push(c);
        self.input_error = None;
    }

    pub fn input_backspace(&mut self) {
        self.input.pop();
        self.input_error = None;
    }

    pub fn input_clear(&mut self) {
        self.input.clear();
        self.input_error = None;
    }

    /// Parse the date field; an empty field clears the date
    pub fn parse_date_input(&self) -> Result<Option<NaiveDate>, String> {
        let text = self.input.trim();
        if text.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", text))
    }
}
