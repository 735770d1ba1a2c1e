use crate::tui::pane::{create_block, Pane, PanelController};
use crate::types::ScanStatus;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const KEY_HELP: &str = "enter start · x stop · tab focus · ↑↓ select · o sort · r reverse · end follow · q quit";

/// STATUS pane: session state, progress and key help
pub struct StatusPane {
    title: &'static str,
    id: &'static str,
}

impl StatusPane {
    pub fn new() -> Self {
        Self {
            title: "spider",
            id: "status",
        }
    }

    fn status_icon_and_color(status: ScanStatus) -> (&'static str, Color) {
        match status {
            ScanStatus::Idle => ("⏹", Color::Green),
            ScanStatus::Running => ("🕷", Color::Yellow),
            ScanStatus::Stopping => ("⏳", Color::Red),
        }
    }
}

impl Default for StatusPane {
    fn default() -> Self {
        Self::new()
    }
}

impl Pane for StatusPane {
    fn render(&mut self, frame: &mut Frame, area: Rect, panel: &PanelController, focused: bool) {
        let block = create_block(self.title, focused);
        let status = panel.status();
        let (icon, color) = Self::status_icon_and_color(status);

        let mut spans = vec![
            Span::styled(format!("{} ", icon), Style::default().fg(color)),
            Span::styled(status.as_str(), Style::default().fg(color)),
        ];

        if let Some(session) = panel.active_session() {
            spans.push(Span::styled(format!("  {}", session.site), Style::default().fg(Color::White)));
        }
        if let Some(progress) = panel.surface().last_progress() {
            spans.push(Span::styled(
                format!("  {} fetched / {} discovered", progress.fetched, progress.discovered),
                Style::default().fg(Color::Gray),
            ));
        }
        if let Some(message) = panel.surface().message() {
            spans.push(Span::styled(format!("  {}", message), Style::default().fg(Color::Red)));
        }

        let lines = vec![
            Line::from(spans),
            Line::from(Span::styled(KEY_HELP, Style::default().fg(Color::DarkGray))),
        ];

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn id(&self) -> &'static str {
        self.id
    }

    fn min_size(&self) -> (u16, u16) {
        (20, 4)
    }
}
