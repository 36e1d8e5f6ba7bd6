use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Width of the file list sidebar
const SIDEBAR_WIDTH: u16 = 32;

/// Areas of the log viewer screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewerAreas {
    pub files: Rect,
    pub header: Rect,
    pub filter: Rect,
    pub stats: Option<Rect>,
    pub logs: Rect,
    pub status: Rect,
}

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Split the screen into file list, header, filter bar, optional stats,
    /// logs and a one-line status bar
    pub fn viewer(area: Rect, show_stats: bool) -> ViewerAreas {
        let rows = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);

        let columns = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
            .split(rows[0]);

        let mut constraints = vec![
            Constraint::Length(3), // Header
            Constraint::Length(3), // Filter bar
        ];
        if show_stats {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Min(1)); // Logs

        let right = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(columns[1]);

        let (stats, logs) = if show_stats {
            (Some(right[2]), right[3])
        } else {
            (None, right[2])
        };

        ViewerAreas {
            files: columns[0],
            header: right[0],
            filter: right[1],
            stats,
            logs,
            status: rows[1],
        }
    }

    /// Centered popup of at most the given size
    pub fn popup(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(4));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }
}
