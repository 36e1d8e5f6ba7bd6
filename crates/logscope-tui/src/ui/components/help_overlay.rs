use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::ui::Layout;

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let popup_area = Layout::popup(frame.area(), 52, 30);
        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Self::section("Files"),
            Self::key_line("j/k", "Move selection"),
            Self::key_line("Enter", "Load selected file"),
            Self::key_line("r", "Refresh file list"),
            Self::key_line("Tab", "Switch focus"),
            Line::from(""),
            Self::section("Logs"),
            Self::key_line("j/k", "Scroll"),
            Self::key_line("Ctrl+d/u", "Page down / up"),
            Self::key_line("g/G", "Top / bottom"),
            Self::key_line("f", "Toggle follow"),
            Self::key_line("s", "Toggle severity counts"),
            Line::from(""),
            Self::section("Filters"),
            Self::key_line("v/V", "Cycle level"),
            Self::key_line("/", "Search text"),
            Self::key_line("d", "Filter by date (YYYY-MM-DD)"),
            Self::key_line("x", "Clear date"),
            Line::from(""),
            Self::section("Actions"),
            Self::key_line("l", "Start / stop live stream"),
            Self::key_line("c", "Clear viewer"),
            Self::key_line("e", "Export view to file"),
            Self::key_line("?", "Toggle this help"),
            Self::key_line("q", "Quit"),
        ];

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn section(name: &str) -> Line<'_> {
        Line::from(Span::styled(name, Style::default().fg(Color::Yellow)))
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {:>8}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}
