//! Shared types for logscope
//!
//! This crate contains data structures used across multiple logscope crates.

use chrono::{DateTime, NaiveDate, Utc};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

// ============================================================================
// Log Types
// ============================================================================

/// Severity tag extracted from a log line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    Info,
    Warn,
    Error,
    Debug,
    Trace,
    /// No recognized bracketed tag
    #[default]
    None,
}

impl Severity {
    /// The five taggable severities, in tag-matching order
    pub const TAGGED: [Severity; 5] = [
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Debug,
        Self::Trace,
    ];

    /// Parse an exact tag token (`INFO`, `WARN`, ...)
    pub fn from_tag(token: &str) -> Self {
        match token {
            "INFO" => Self::Info,
            "WARN" => Self::Warn,
            "ERROR" => Self::Error,
            "DEBUG" => Self::Debug,
            "TRACE" => Self::Trace,
            _ => Self::None,
        }
    }

    /// Tag token without brackets
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Self::Info => Some("INFO"),
            Self::Warn => Some("WARN"),
            Self::Error => Some("ERROR"),
            Self::Debug => Some("DEBUG"),
            Self::Trace => Some("TRACE"),
            Self::None => None,
        }
    }

    /// Get display color for this severity
    pub fn color(&self) -> Color {
        match self {
            Self::Trace => Color::DarkGray,
            Self::Debug => Color::Cyan,
            Self::Info => Color::Green,
            Self::Warn => Color::Yellow,
            Self::Error => Color::Red,
            Self::None => Color::White,
        }
    }

    /// Short display string (3 chars)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRC",
            Self::Debug => "DBG",
            Self::Info => "INF",
            Self::Warn => "WRN",
            Self::Error => "ERR",
            Self::None => "   ",
        }
    }
}

/// Level selection for the filter bar
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum LevelFilter {
    #[default]
    All,
    Info,
    Warn,
    Error,
    Debug,
    Trace,
}

impl LevelFilter {
    /// Parse a level name, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Some(Self::All),
            "INFO" => Some(Self::Info),
            "WARN" => Some(Self::Warn),
            "ERROR" => Some(Self::Error),
            "DEBUG" => Some(Self::Debug),
            "TRACE" => Some(Self::Trace),
            _ => None,
        }
    }

    /// The severity this filter selects, `None` for `All`
    pub fn severity(&self) -> Option<Severity> {
        match self {
            Self::All => None,
            Self::Info => Some(Severity::Info),
            Self::Warn => Some(Severity::Warn),
            Self::Error => Some(Severity::Error),
            Self::Debug => Some(Severity::Debug),
            Self::Trace => Some(Severity::Trace),
        }
    }

    /// Bracketed tag form, e.g. `[ERROR]`
    pub fn bracketed(&self) -> Option<String> {
        self.severity()
            .and_then(|s| s.tag())
            .map(|tag| format!("[{}]", tag))
    }

    /// Get display label for this filter
    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }

    /// Cycle to the next level
    pub fn next(&self) -> Self {
        match self {
            Self::All => Self::Info,
            Self::Info => Self::Warn,
            Self::Warn => Self::Error,
            Self::Error => Self::Debug,
            Self::Debug => Self::Trace,
            Self::Trace => Self::All,
        }
    }

    /// Cycle to the previous level
    pub fn prev(&self) -> Self {
        match self {
            Self::All => Self::Trace,
            Self::Info => Self::All,
            Self::Warn => Self::Info,
            Self::Error => Self::Warn,
            Self::Debug => Self::Error,
            Self::Trace => Self::Debug,
        }
    }
}

/// A classified log line
///
/// Lines are immutable once classified; the store only ever moves or drops them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    raw: String,
    severity: Severity,
}

impl LogLine {
    pub fn new(raw: String, severity: Severity) -> Self {
        Self { raw, severity }
    }

    /// Original raw text
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Whether the line has no visible content
    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }
}

/// Filter criteria applied to the displayed set
///
/// Replaced wholesale on every change, the `with_*` methods return a new value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub level: LevelFilter,
    pub search: String,
    pub date: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn new(level: LevelFilter, search: impl Into<String>, date: Option<NaiveDate>) -> Self {
        Self {
            level,
            search: search.into(),
            date,
        }
    }

    pub fn with_level(&self, level: LevelFilter) -> Self {
        Self {
            level,
            ..self.clone()
        }
    }

    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..self.clone()
        }
    }

    pub fn with_date(&self, date: Option<NaiveDate>) -> Self {
        Self {
            date,
            ..self.clone()
        }
    }

    /// Date as it appears in log lines (`YYYY-MM-DD`)
    pub fn date_string(&self) -> Option<String> {
        self.date.map(|d| d.format("%Y-%m-%d").to_string())
    }

    /// Check if level and search select everything
    pub fn is_identity(&self) -> bool {
        self.level == LevelFilter::All && self.search.is_empty()
    }
}

/// Which line set is active
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StoreMode {
    #[default]
    Static,
    Live,
}

impl StoreMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Live => "live",
        }
    }
}

// ============================================================================
// Source Types
// ============================================================================

/// A log file available from a source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFileInfo {
    pub name: String,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,

    /// Gzip-compressed rotated log (`*.gz`)
    pub compressed: bool,
}

impl LogFileInfo {
    pub fn new(name: String, size_bytes: u64, modified: DateTime<Utc>) -> Self {
        let compressed = is_compressed_name(&name);
        Self {
            name,
            size_bytes,
            modified,
            compressed,
        }
    }

    /// Format size as a short human-readable string
    pub fn human_size(&self) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        let mut size = self.size_bytes as f64;
        let mut unit = 0;
        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            format!("{} {}", self.size_bytes, UNITS[0])
        } else {
            format!("{:.1} {}", size, UNITS[unit])
        }
    }
}

/// Whether a log file name refers to a gzip-compressed file
pub fn is_compressed_name(name: &str) -> bool {
    name.ends_with(".gz")
}

// ============================================================================
// Status Types
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StatusKind {
    #[default]
    Info,
    Success,
    Error,
}

/// Human-readable status line shown to the operator
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Info,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}
