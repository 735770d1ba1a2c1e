use crate::tui::pane::{create_block, Pane, PanelController};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// SITES pane: the target selector. Locked while a crawl is running.
pub struct SitesPane {
    title: &'static str,
    id: &'static str,
}

impl SitesPane {
    pub fn new() -> Self {
        Self {
            title: "sites",
            id: "sites",
        }
    }

    fn site_line(name: &str, selected: bool, enabled: bool) -> Line<'static> {
        let marker = if selected { "▶ " } else { "  " };
        let style = match (selected, enabled) {
            (true, true) => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            (true, false) => Style::default().fg(Color::Yellow),
            (false, true) => Style::default().fg(Color::White),
            (false, false) => Style::default().fg(Color::DarkGray),
        };
        Line::from(vec![
            Span::styled(marker, style),
            Span::styled(name.to_string(), style),
        ])
    }
}

impl Default for SitesPane {
    fn default() -> Self {
        Self::new()
    }
}

impl Pane for SitesPane {
    fn render(&mut self, frame: &mut Frame, area: Rect, panel: &PanelController, focused: bool) {
        let enabled = panel.surface().selection_enabled();
        let title = if enabled {
            self.title.to_string()
        } else {
            format!("{} (locked)", self.title)
        };
        let block = create_block(&title, focused);

        let selected = panel.selected_site();
        let mut lines: Vec<Line> = panel.registry()
            .sites()
            .iter()
            .map(|site| Self::site_line(&site.name, selected == Some(site.name.as_str()), enabled))
            .collect();

        if lines.is_empty() {
            lines.push(Line::from(Span::styled("No sites", Style::default().fg(Color::Gray))));
        }

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn id(&self) -> &'static str {
        self.id
    }
}
