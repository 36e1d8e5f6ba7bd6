use ratatui::style::{Color, Modifier, Style};

use logscope_types::{Severity, StatusKind};

/// Color theme for the application
pub struct Theme;

impl Theme {
    // Base colors
    pub const BG: Color = Color::Reset;
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    // Accent colors
    pub const PRIMARY: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;

    // Status colors
    pub const SUCCESS: Color = Color::Green;
    pub const ERROR: Color = Color::Red;

    pub fn border(focused: bool) -> Style {
        if focused {
            Style::default().fg(Self::PRIMARY)
        } else {
            Style::default().fg(Self::FG_DIM)
        }
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    // List styles
    pub fn list_item() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn list_item_selected() -> Style {
        Style::default()
            .fg(Self::BG)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn list_item_current() -> Style {
        Style::default()
            .fg(Self::SUCCESS)
            .add_modifier(Modifier::BOLD)
    }

    // Log lines
    pub fn severity_tag(severity: Severity) -> Style {
        Style::default()
            .fg(severity.color())
            .add_modifier(Modifier::BOLD)
    }

    pub fn severity_text(severity: Severity) -> Style {
        match severity {
            Severity::Error => Style::default().fg(Self::ERROR),
            Severity::Warn => Style::default().fg(Self::HIGHLIGHT),
            _ => Self::text(),
        }
    }

    pub fn search_match() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    // Status bar
    pub fn status_bar() -> Style {
        Style::default().fg(Color::Gray).bg(Color::DarkGray)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status(kind: StatusKind) -> Style {
        let fg = match kind {
            StatusKind::Info => Color::Gray,
            StatusKind::Success => Self::SUCCESS,
            StatusKind::Error => Self::ERROR,
        };
        Style::default()
            .fg(fg)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }
}
