use crate::tui::pane::{create_block, Pane, PanelController};
use crate::types::ResultRecord;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Cell, Row, Table, TableState},
    Frame,
};

const PROCESSED_COLUMN_WIDTH: u16 = 9;
const METHOD_COLUMN_WIDTH: u16 = 8;
const URI_COLUMN_MIN_WIDTH: u16 = 30;
const FLAGS_COLUMN_WIDTH: u16 = 25;
const HEADER_HEIGHT: u16 = 1;
const BORDER_WIDTH: u16 = 1;

/// RESULTS pane: one row per discovered resource
pub struct ResultsPane {
    title: &'static str,
    id: &'static str,
    table_state: TableState,
    area: Rect,
}

impl ResultsPane {
    pub fn new() -> Self {
        Self {
            title: "results",
            id: "results",
            table_state: TableState::default(),
            area: Rect::default(),
        }
    }

    /// Result log index of the row drawn at terminal line `y`, from the last render
    pub fn row_at(&self, panel: &PanelController, x: u16, y: u16) -> Option<usize> {
        let first_row_y = self.area.y + BORDER_WIDTH + HEADER_HEIGHT;
        let last_row_y = (self.area.y + self.area.height).saturating_sub(BORDER_WIDTH);
        let inside_x = x >= self.area.x && x < self.area.x + self.area.width;
        if !inside_x || y < first_row_y || y >= last_row_y {
            return None;
        }

        let position = self.table_state.offset() + (y - first_row_y) as usize;
        let order = panel.surface().display_order(panel.log().records());
        order.get(position).copied()
    }

    /// Number of result rows that fit in the last rendered area
    pub fn visible_rows(&self) -> usize {
        self.area.height.saturating_sub(2 * BORDER_WIDTH + HEADER_HEIGHT) as usize
    }

    fn record_row(record: &ResultRecord) -> Row<'static> {
        let (processed, style) = if record.processed() {
            ("✓", Style::default().fg(Color::Green))
        } else {
            ("–", Style::default().fg(Color::DarkGray))
        };
        let flags_style = if record.flags.is_empty() {
            Style::default()
        } else {
            Style::default().fg(Color::Yellow)
        };

        Row::new(vec![
            Cell::from(processed).style(style),
            Cell::from(record.method.clone()),
            Cell::from(record.uri.clone()),
            Cell::from(record.flags.clone()).style(flags_style),
        ])
    }
}

impl Default for ResultsPane {
    fn default() -> Self {
        Self::new()
    }
}

impl Pane for ResultsPane {
    fn render(&mut self, frame: &mut Frame, area: Rect, panel: &PanelController, focused: bool) {
        self.area = area;

        let surface = panel.surface();
        let records = panel.log().records();
        let order = surface.display_order(records);
        let (sort, descending) = surface.sort();

        let title = format!("{} ({}) sort: {}{}", self.title, records.len(), sort.label(),
            if descending { " ↓" } else { "" });
        let block = create_block(&title, focused);

        let header = Row::new(vec!["Processed", "Method", "URI", "Flags"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        let rows: Vec<Row> = order.iter().map(|index| Self::record_row(&records[*index])).collect();

        let selected = surface.selected_row()
            .and_then(|row| order.iter().position(|r| *r == row));
        self.table_state.select(selected);
        if selected.is_none() && surface.follow_tail() {
            *self.table_state.offset_mut() = order.len().saturating_sub(self.visible_rows());
        }

        let table = Table::new(rows, [
            Constraint::Length(PROCESSED_COLUMN_WIDTH),
            Constraint::Length(METHOD_COLUMN_WIDTH),
            Constraint::Min(URI_COLUMN_MIN_WIDTH),
            Constraint::Length(FLAGS_COLUMN_WIDTH),
        ])
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn id(&self) -> &'static str {
        self.id
    }

    fn min_size(&self) -> (u16, u16) {
        (URI_COLUMN_MIN_WIDTH + PROCESSED_COLUMN_WIDTH + METHOD_COLUMN_WIDTH, 5)
    }
}
