use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

use crate::app::SidebarMode;

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Split the screen into content, an optional command bar and the status bar
    pub fn main(area: Rect, command_mode: bool) -> (Rect, Option<Rect>, Rect) {
        let command_height = if command_mode { 1 } else { 0 };
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),                 // Content
                Constraint::Length(command_height), // Command bar
                Constraint::Length(1),              // Status bar
            ])
            .split(area);

        let command = command_mode.then_some(chunks[1]);
        (chunks[0], command, chunks[2])
    }

    /// Split the content area between the log list and the detail sidebar
    pub fn log_viewer(area: Rect, sidebar: SidebarMode) -> (Option<Rect>, Option<Rect>) {
        match sidebar {
            SidebarMode::Hidden => (Some(area), None),
            SidebarMode::Fullscreen => (None, Some(area)),
            SidebarMode::Visible => {
                let chunks = RatatuiLayout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Percentage(60), // Log list
                        Constraint::Percentage(40), // Detail sidebar
                    ])
                    .split(area);
                (Some(chunks[0]), Some(chunks[1]))
            }
        }
    }

    /// A centered popup of at most `width` x `height`
    pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(2));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }

    /// Rows of log content inside a bordered block
    pub fn inner_height(area: Rect) -> usize {
        area.height.saturating_sub(2) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_reserves_status_line() {
        let area = Rect::new(0, 0, 80, 24);
        let (content, command, status) = Layout::main(area, false);
        assert_eq!(content.height, 23);
        assert!(command.is_none());
        assert_eq!(status.y, 23);

        let (content, command, _) = Layout::main(area, true);
        assert_eq!(content.height, 22);
        assert_eq!(command.map(|r| r.y), Some(22));
    }

    #[test]
    fn test_sidebar_modes() {
        let area = Rect::new(0, 0, 100, 20);
        assert_eq!(Layout::log_viewer(area, SidebarMode::Hidden), (Some(area), None));
        assert_eq!(Layout::log_viewer(area, SidebarMode::Fullscreen), (None, Some(area)));

        let (logs, detail) = Layout::log_viewer(area, SidebarMode::Visible);
        let (logs, detail) = (logs.unwrap(), detail.unwrap());
        assert_eq!(logs.width + detail.width, 100);
        assert!(logs.width > detail.width);
    }

    #[test]
    fn test_centered_fits_area() {
        let area = Rect::new(0, 0, 40, 10);
        let popup = Layout::centered(area, 60, 30);
        assert!(popup.width <= 36);
        assert!(popup.height <= 8);
        assert!(popup.x + popup.width <= area.width);
    }
}
