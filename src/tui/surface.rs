use crate::controller::RenderingSurface;
use crate::result_log::TableView;
use crate::types::{ResultRecord, ScanProgress};
use std::cmp::Ordering;

/// Column the results table is ordered by. `Arrival` is the log's own order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Arrival,
    Processed,
    Method,
    Uri,
    Flags,
}

impl SortColumn {
    pub fn next(self) -> Self {
        match self {
            SortColumn::Arrival => SortColumn::Processed,
            SortColumn::Processed => SortColumn::Method,
            SortColumn::Method => SortColumn::Uri,
            SortColumn::Uri => SortColumn::Flags,
            SortColumn::Flags => SortColumn::Arrival,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortColumn::Arrival => "arrival",
            SortColumn::Processed => "processed",
            SortColumn::Method => "method",
            SortColumn::Uri => "uri",
            SortColumn::Flags => "flags",
        }
    }

    fn compare(self, a: &ResultRecord, b: &ResultRecord) -> Ordering {
        match self {
            SortColumn::Arrival => Ordering::Equal,
            SortColumn::Processed => a.processed().cmp(&b.processed()),
            SortColumn::Method => a.method.cmp(&b.method),
            SortColumn::Uri => a.uri.cmp(&b.uri),
            SortColumn::Flags => a.flags.cmp(&b.flags),
        }
    }
}

/// View-side state of the terminal panel, kept in step by controller notifications
#[derive(Debug)]
pub struct TuiSurface {
    selection_enabled: bool,
    selected_row: Option<usize>,
    follow_tail: bool,
    sort: SortColumn,
    descending: bool,
    rows: usize,
    last_progress: Option<ScanProgress>,
    message: Option<String>,
}

impl TuiSurface {
    pub fn new() -> Self {
        Self {
            selection_enabled: true,
            selected_row: None,
            follow_tail: true,
            sort: SortColumn::Arrival,
            descending: false,
            rows: 0,
            last_progress: None,
            message: None,
        }
    }

    pub fn selection_enabled(&self) -> bool {
        self.selection_enabled
    }

    /// Selected row as a result log index
    pub fn selected_row(&self) -> Option<usize> {
        self.selected_row
    }

    pub fn follow_tail(&self) -> bool {
        self.follow_tail
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn last_progress(&self) -> Option<ScanProgress> {
        self.last_progress
    }

    pub fn sort(&self) -> (SortColumn, bool) {
        (self.sort, self.descending)
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        log::debug!("[tui::surface] sort: column={} descending={}", self.sort.label(), self.descending);
    }

    pub fn toggle_sort_direction(&mut self) {
        self.descending = !self.descending;
        log::debug!("[tui::surface] sort: column={} descending={}", self.sort.label(), self.descending);
    }

    /// Go back to tracking the newest row
    pub fn resume_follow(&mut self) {
        self.selected_row = None;
        self.follow_tail = true;
    }

    /// Row indices in display order. The log itself is never reordered.
    pub fn display_order(&self, records: &[ResultRecord]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..records.len()).collect();
        if self.sort != SortColumn::Arrival {
            order.sort_by(|a, b| self.sort.compare(&records[*a], &records[*b]));
        }
        if self.descending {
            order.reverse();
        }
        order
    }

    /// Move the row selection `delta` steps through the display order
    pub fn move_selection(&mut self, records: &[ResultRecord], delta: isize) {
        let order = self.display_order(records);
        if order.is_empty() {
            return;
        }
        let current = self.selected_row
            .and_then(|row| order.iter().position(|r| *r == row));
        let next = match current {
            Some(pos) => pos.saturating_add_signed(delta).min(order.len() - 1),
            None if delta < 0 => order.len() - 1,
            None => 0,
        };
        self.select_row(Some(order[next]));
    }
}

impl Default for TuiSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TableView for TuiSurface {
    fn row_inserted(&mut self, index: usize, _record: &ResultRecord) {
        self.rows = index + 1;
    }

    fn all_rows_cleared(&mut self) {
        self.rows = 0;
        self.resume_follow();
    }
}

impl RenderingSurface for TuiSurface {
    fn selection_enabled_changed(&mut self, enabled: bool) {
        self.selection_enabled = enabled;
        if !enabled {
            self.last_progress = None;
        }
    }

    fn progress_changed(&mut self, _site: &str, progress: ScanProgress) {
        self.last_progress = Some(progress);
    }

    fn select_row(&mut self, row: Option<usize>) {
        log::trace!("[tui::surface] select_row: row={:?}", row);
        self.selected_row = row;
        self.follow_tail = row.is_none();
    }
}
