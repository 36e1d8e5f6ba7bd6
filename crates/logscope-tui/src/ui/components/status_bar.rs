use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use logscope_types::StatusMessage;

use crate::ui::Theme;

/// Status bar showing the last status message, keyboard shortcuts and a
/// right-aligned summary
pub struct StatusBar<'a> {
    message: Option<&'a StatusMessage>,
    hints: Vec<(&'a str, &'a str)>,
    right_text: Option<String>,
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self {
            message: None,
            hints: Vec::new(),
            right_text: None,
        }
    }

    pub fn message(mut self, message: &'a StatusMessage) -> Self {
        self.message = Some(message).filter(|m| !m.text.is_empty());
        self
    }

    /// Add keyboard hints as (key, description) pairs
    pub fn hints<I>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.hints = hints.into_iter().collect();
        self
    }

    /// Set text to display on the right side
    pub fn right<S: Into<String>>(mut self, text: S) -> Self {
        self.right_text = Some(text.into());
        self
    }
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Theme::status_bar());

        let mut spans = Vec::new();
        if let Some(message) = self.message {
            spans.push(Span::styled(format!("{} ", message.text), Theme::status(message.kind)));
            spans.push(Span::styled("│ ", Theme::status_bar()));
        }
        for (i, (key, desc)) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" ", Theme::status_bar()));
            }
            spans.push(Span::styled(format!("[{}]", key), Theme::status_bar_key()));
            spans.push(Span::styled(desc.to_string(), Theme::status_bar()));
        }

        let line = Line::from(spans);
        let line_width = line.width() as u16;
        buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(2));

        // Right text only when it does not overlap the hints
        if let Some(right) = self.right_text {
            let width = right.chars().count() as u16;
            let right_x = area.x + area.width.saturating_sub(width + 1);
            if right_x > area.x + line_width + 2 {
                buf.set_span(right_x, area.y, &Span::styled(right, Theme::status_bar()), width);
            }
        }
    }
}

/// Hints shown in the log viewer
pub fn viewer_hints() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Tab", "Focus"),
        ("l", "Live"),
        ("v", "Level"),
        ("/", "Search"),
        ("d", "Date"),
        ("e", "Export"),
        ("?", "Help"),
        ("q", "Quit"),
    ]
}
