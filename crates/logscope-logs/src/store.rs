use std::collections::VecDeque;

use tracing::{debug, trace};

use logscope_types::{LogLine, Severity, StoreMode};

use crate::classify;

/// Maximum number of live lines kept in memory
pub const LIVE_CAPACITY: usize = 1000;

/// Owner of the static and live line sets
///
/// Static lines keep file order (oldest first). Live lines keep arrival order
/// newest first, and never exceed the live capacity: the oldest arrival is
/// evicted on overflow. Blank lines are never stored.
#[derive(Debug)]
pub struct LogStore {
    /// Which set is displayed
    mode: StoreMode,

    /// Lines of the loaded file, oldest first
    static_lines: Vec<LogLine>,

    /// Streamed lines, newest at the front
    live_lines: VecDeque<LogLine>,

    /// Maximum live lines
    live_capacity: usize,

    /// Name of the loaded file
    active_file: Option<String>,
}

impl LogStore {
    /// Create an empty store with the default live capacity
    pub fn new() -> Self {
        Self::with_capacity(LIVE_CAPACITY)
    }

    /// Create an empty store with the given live capacity
    pub fn with_capacity(live_capacity: usize) -> Self {
        let live_capacity = live_capacity.max(1);
        Self {
            mode: StoreMode::Static,
            static_lines: Vec::new(),
            live_lines: VecDeque::with_capacity(live_capacity.min(LIVE_CAPACITY)),
            live_capacity,
            active_file: None,
        }
    }

    /// Replace the static set with the lines of a loaded file
    ///
    /// Switches back to static mode and drops any live lines.
    pub fn load_file(&mut self, name: &str, text: &str) {
        self.static_lines = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(classify)
            .collect();
        self.active_file = Some(name.to_string());
        self.mode = StoreMode::Static;
        self.live_lines.clear();
        debug!(file = name, lines = self.static_lines.len(), "file loaded into store");
    }

    /// Add a streamed line at the head of the live set
    ///
    /// Returns false for blank input, which is ignored.
    pub fn append_live(&mut self, raw: &str) -> bool {
        if raw.trim().is_empty() {
            return false;
        }
        self.live_lines.push_front(classify(raw));
        if self.live_lines.len() > self.live_capacity {
            if let Some(evicted) = self.live_lines.pop_back() {
                trace!(line = evicted.raw(), "evicted oldest live line");
            }
        }
        true
    }

    /// Switch the active set without clearing either one
    pub fn set_mode(&mut self, mode: StoreMode) {
        self.mode = mode;
    }

    /// Reset to the initial empty state
    pub fn clear(&mut self) {
        self.mode = StoreMode::Static;
        self.static_lines.clear();
        self.live_lines.clear();
        self.active_file = None;
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    pub fn active_file(&self) -> Option<&str> {
        self.active_file.as_deref()
    }

    /// Lines of the loaded file, oldest first
    pub fn static_lines(&self) -> &[LogLine] {
        &self.static_lines
    }

    /// Streamed lines, newest first
    pub fn live_lines(&self) -> impl Iterator<Item = &LogLine> {
        self.live_lines.iter()
    }

    pub fn live_len(&self) -> usize {
        self.live_lines.len()
    }

    pub fn live_capacity(&self) -> usize {
        self.live_capacity
    }

    /// Lines of the set selected by the current mode, in display order
    pub fn active_lines(&self) -> Box<dyn Iterator<Item = &LogLine> + '_> {
        match self.mode {
            StoreMode::Static => Box::new(self.static_lines.iter()),
            StoreMode::Live => Box::new(self.live_lines.iter()),
        }
    }

    /// Number of lines in the active set
    pub fn active_len(&self) -> usize {
        match self.mode {
            StoreMode::Static => self.static_lines.len(),
            StoreMode::Live => self.live_lines.len(),
        }
    }

    /// Check if both sets are empty
    pub fn is_empty(&self) -> bool {
        self.static_lines.is_empty() && self.live_lines.is_empty()
    }

    /// Count lines per severity in the active set
    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for line in self.active_lines() {
            match line.severity() {
                Severity::Info => counts.info += 1,
                Severity::Warn => counts.warn += 1,
                Severity::Error => counts.error += 1,
                Severity::Debug => counts.debug += 1,
                Severity::Trace => counts.trace += 1,
                Severity::None => counts.untagged += 1,
            }
        }
        counts
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts per severity
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub info: usize,
    pub warn: usize,
    pub error: usize,
    pub debug: usize,
    pub trace: usize,
    pub untagged: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.info + self.warn + self.error + self.debug + self.trace + self.untagged
    }
}
