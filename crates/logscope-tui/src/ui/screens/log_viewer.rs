use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use logscope_logs::{ProjectionBranch, Session, StreamState};
use logscope_types::{LogLine, Severity, StoreMode};

use crate::app::{Focus, InputMode, UiState};
use crate::ui::components::{viewer_hints, FileList, StatusBar};
use crate::ui::{Layout, Theme};

/// Main screen: file list, filters and the projected log view
pub struct LogViewerScreen;

/// Truncate to at most `max_chars` characters, marking the cut with "..."
fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Split `text` into spans, highlighting case-insensitive occurrences of a
/// lowercased needle
fn highlight_spans(text: &str, needle: &str, base: Style) -> Vec<Span<'static>> {
    let lower = text.to_lowercase();
    // Offsets only line up when lowercasing kept every byte length
    if needle.is_empty() || lower.len() != text.len() {
        return vec![Span::styled(text.to_string(), base)];
    }

    let mut spans = Vec::new();
    let mut last_end = 0;
    for (start, matched) in lower.match_indices(needle) {
        let end = start + matched.len();
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            continue;
        }
        if start > last_end {
            spans.push(Span::styled(text[last_end..start].to_string(), base));
        }
        spans.push(Span::styled(text[start..end].to_string(), Theme::search_match()));
        last_end = end;
    }
    if last_end < text.len() {
        spans.push(Span::styled(text[last_end..].to_string(), base));
    }
    spans
}

impl LogViewerScreen {
    pub fn render(frame: &mut Frame, session: &Session, ui: &mut UiState) {
        let areas = Layout::viewer(frame.area(), ui.stats_visible);

        Self::render_files(frame, areas.files, session, ui);
        Self::render_header(frame, areas.header, session);
        Self::render_filter_bar(frame, areas.filter, session, ui);
        if let Some(stats) = areas.stats {
            Self::render_stats_bar(frame, stats, session);
        }
        Self::render_logs(frame, areas.logs, session, ui);
        Self::render_status_bar(frame, areas.status, session, ui);
    }

    fn render_files(frame: &mut Frame, area: Rect, session: &Session, ui: &mut UiState) {
        let list = FileList::new(session.files())
            .active(session.store().active_file())
            .focused(ui.focus == Focus::Files);
        frame.render_stateful_widget(list, area, &mut ui.list_state);
    }

    fn render_header(frame: &mut Frame, area: Rect, session: &Session) {
        let file = session.store().active_file().unwrap_or("no file loaded");
        let mode = session.store().mode();
        let state = session.stream_state();

        let mode_style = match mode {
            StoreMode::Live => Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            StoreMode::Static => Theme::text(),
        };
        let state_style = match state {
            StreamState::Streaming => Style::default().fg(Color::Green),
            StreamState::Connecting => Style::default().fg(Color::Yellow),
            StreamState::Error => Style::default().fg(Color::Red),
            StreamState::Idle => Theme::text_dim(),
        };

        let title = Line::from(vec![
            Span::styled("logscope", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(file, Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(mode.label(), mode_style),
            Span::styled(" │ stream ", Theme::text_dim()),
            Span::styled(state.label(), state_style),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(session.line_counter().label(), Theme::text()),
        ]);

        let header = Paragraph::new(title).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border(false)),
        );
        frame.render_widget(header, area);
    }

    fn render_filter_bar(frame: &mut Frame, area: Rect, session: &Session, ui: &UiState) {
        let criteria = session.criteria();
        let prompt_style = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let cursor = Span::styled(
            "█",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::SLOW_BLINK),
        );

        let mut spans = vec![
            Span::styled(" Level: ", Theme::text_dim()),
            Span::styled(criteria.level.label(), Theme::text_highlight()),
            Span::styled("  Search: ", Theme::text_dim()),
        ];

        if ui.input_mode == InputMode::Search {
            spans.push(Span::styled("/", prompt_style));
            spans.push(Span::styled(ui.input.clone(), Theme::text_highlight()));
            spans.push(cursor.clone());
        } else if criteria.search.is_empty() {
            spans.push(Span::styled("-", Theme::text_dim()));
        } else {
            spans.push(Span::styled(criteria.search.clone(), Theme::text_highlight()));
        }

        spans.push(Span::styled("  Date: ", Theme::text_dim()));
        if ui.input_mode == InputMode::Date {
            spans.push(Span::styled(ui.input.clone(), Theme::text_highlight()));
            spans.push(cursor);
        } else {
            match criteria.date_string() {
                Some(date) => spans.push(Span::styled(date, Theme::text_highlight())),
                None => spans.push(Span::styled("-", Theme::text_dim())),
            }
        }

        // Date narrowing only applies to the static set
        match session.branch() {
            ProjectionBranch::Date => spans.push(Span::styled(
                "  (date replaces level and search)",
                Theme::text_dim(),
            )),
            ProjectionBranch::Live if criteria.date.is_some() => {
                spans.push(Span::styled("  (date ignored while live)", Theme::text_dim()))
            }
            _ => {}
        }

        if let Some(err) = &ui.input_error {
            spans.push(Span::styled(
                format!("  ⚠ {}", err),
                Style::default().fg(Color::Red),
            ));
        } else if ui.is_editing() {
            spans.push(Span::styled(
                "  [Enter] Apply  [Esc] Close",
                Theme::text_dim(),
            ));
        }

        let border_style = if ui.input_error.is_some() {
            Style::default().fg(Color::Red)
        } else if ui.is_editing() {
            Style::default().fg(Color::Yellow)
        } else {
            Theme::border(false)
        };

        let filter_bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(" Filters ", Theme::title())),
        );
        frame.render_widget(filter_bar, area);
    }

    fn render_stats_bar(frame: &mut Frame, area: Rect, session: &Session) {
        let counts = session.store().severity_counts();

        let mut spans = vec![Span::styled(" ", Theme::text())];
        for (severity, count) in [
            (Severity::Error, counts.error),
            (Severity::Warn, counts.warn),
            (Severity::Info, counts.info),
            (Severity::Debug, counts.debug),
            (Severity::Trace, counts.trace),
        ] {
            spans.push(Span::styled(
                format!("{}:", severity.as_str()),
                Theme::severity_tag(severity),
            ));
            spans.push(Span::styled(format!("{} ", count), Theme::text()));
        }
        spans.push(Span::styled("│ ", Theme::text_dim()));
        spans.push(Span::styled("Total:", Theme::text_dim()));
        spans.push(Span::styled(counts.total().to_string(), Theme::text()));

        let stats_widget = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border(false))
                .title(Span::styled(" Severity ", Theme::title())),
        );
        frame.render_widget(stats_widget, area);
    }

    fn render_logs(frame: &mut Frame, area: Rect, session: &Session, ui: &mut UiState) {
        let view = session.view();
        let branch = session.branch();
        let total = view.len();

        let inner_height = area.height.saturating_sub(2) as usize;
        let max_scroll = total.saturating_sub(inner_height);

        // Newest lines sit at the top of the live view and at the bottom of a file
        if ui.follow {
            ui.log_scroll = match branch {
                ProjectionBranch::Live => 0,
                ProjectionBranch::Date | ProjectionBranch::Static => max_scroll,
            };
        }
        ui.log_scroll = ui.log_scroll.min(max_scroll);

        // 2 for borders, 1 for the scrollbar, 4 for the severity column
        let message_width = area.width.saturating_sub(7) as usize;
        let needle = session.criteria().search.to_lowercase();
        let highlight = branch != ProjectionBranch::Date;

        let lines: Vec<Line> = view
            .iter()
            .skip(ui.log_scroll)
            .take(inner_height)
            .map(|line| Self::format_line(line, message_width, highlight.then_some(needle.as_str())))
            .collect();

        let order = match branch {
            ProjectionBranch::Live => "live, newest first",
            ProjectionBranch::Date => "by date",
            ProjectionBranch::Static => "file",
        };
        let title = format!(" Logs ({} shown, {}) ", total, order);

        let logs_widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border(ui.focus == Focus::Logs))
                .title(Span::styled(title, Theme::title())),
        );
        frame.render_widget(logs_widget, area);

        if total > inner_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_scroll)
                .position(ui.log_scroll);

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    /// One display row: severity column then the raw text
    fn format_line(line: &LogLine, width: usize, needle: Option<&str>) -> Line<'static> {
        let severity = line.severity();
        let mut spans = vec![Span::styled(
            format!("{} ", severity.as_str()),
            Theme::severity_tag(severity),
        )];

        let text = truncate_chars(line.raw(), width);
        let base = Theme::severity_text(severity);
        match needle {
            Some(needle) => spans.extend(highlight_spans(&text, needle, base)),
            None => spans.push(Span::styled(text, base)),
        }
        Line::from(spans)
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, session: &Session, ui: &UiState) {
        let right = format!(
            "{} {}",
            session.line_counter().label(),
            if ui.follow { "▼" } else { " " }
        );
        let bar = StatusBar::new()
            .message(session.status())
            .hints(viewer_hints())
            .right(right);
        frame.render_widget(bar, area);
    }
}
