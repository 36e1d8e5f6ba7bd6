use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget},
};

use logscope_types::LogFileInfo;

use crate::ui::Theme;

/// Sidebar listing the log files offered by the source
pub struct FileList<'a> {
    files: &'a [LogFileInfo],
    active: Option<&'a str>,
    focused: bool,
}

impl<'a> FileList<'a> {
    pub fn new(files: &'a [LogFileInfo]) -> Self {
        Self {
            files,
            active: None,
            focused: false,
        }
    }

    /// Mark the currently loaded file
    pub fn active(mut self, active: Option<&'a str>) -> Self {
        self.active = active;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn item(&self, file: &LogFileInfo) -> ListItem<'static> {
        let is_active = self.active == Some(file.name.as_str());
        let style = if is_active {
            Theme::list_item_current()
        } else {
            Theme::list_item()
        };

        ListItem::new(vec![
            Line::from(Span::styled(file.name.clone(), style)),
            Line::from(Span::styled(
                format!(
                    "  {}{} · {}",
                    file.human_size(),
                    if file.compressed { " gz" } else { "" },
                    file.modified.format("%Y-%m-%d %H:%M")
                ),
                Theme::text_dim(),
            )),
        ])
    }
}

impl StatefulWidget for FileList<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let title = format!(" Files ({}) ", self.files.len());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border(self.focused))
            .title(Span::styled(title, Theme::title()));

        if self.files.is_empty() {
            let empty = List::new([ListItem::new(Span::styled("  no log files", Theme::text_dim()))])
                .block(block);
            StatefulWidget::render(empty, area, buf, &mut ListState::default());
            return;
        }

        let items: Vec<ListItem> = self.files.iter().map(|f| self.item(f)).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Theme::list_item_selected())
            .highlight_symbol("▶ ");

        StatefulWidget::render(list, area, buf, state);
    }
}
