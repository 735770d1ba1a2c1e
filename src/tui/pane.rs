use crate::controller::ScanController;
use crate::tui::surface::TuiSurface;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders},
    Frame,
};
use log;

const DEFAULT_MIN_PANE_WIDTH: u16 = 20;
const DEFAULT_MIN_PANE_HEIGHT: u16 = 3;

/// The panel state every pane renders from
pub type PanelController = ScanController<TuiSurface>;

/// Trait for TUI panes that display part of the spider panel
pub trait Pane {
    /// Render the pane content to the given area
    fn render(&mut self, frame: &mut Frame, area: Rect, panel: &PanelController, focused: bool);

    /// Get the pane's identifier
    fn id(&self) -> &'static str;

    /// Get the pane's preferred minimum size (width, height)
    fn min_size(&self) -> (u16, u16) {
        (DEFAULT_MIN_PANE_WIDTH, DEFAULT_MIN_PANE_HEIGHT)
    }
}

/// Helper function to create a standard bordered block for panes
pub fn create_block(title: &str, focused: bool) -> Block<'static> {
    log::trace!("[tui::pane] create_block: title={} focused={}", title, focused);

    Block::default()
        .title(title.to_uppercase())
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        })
}
