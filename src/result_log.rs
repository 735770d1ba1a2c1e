use crate::types::ResultRecord;
use log;

/// Observer for row-level changes to a [`ResultLog`]
pub trait TableView {
    /// A record was appended at `index` (always the last row)
    fn row_inserted(&mut self, index: usize, record: &ResultRecord);

    /// Every row was removed
    fn all_rows_cleared(&mut self);
}

/// Append-only, arrival-ordered log of discovered resources.
///
/// Mutations take the view to notify as an argument so the log never shares ownership of the
/// rendering surface. Sorting and filtering belong to the view, never to the log.
#[derive(Debug, Default)]
pub struct ResultLog {
    records: Vec<ResultRecord>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and tell the view a row was inserted at the end.
    ///
    /// Returns the index of the new row.
    pub fn append(&mut self, record: ResultRecord, view: &mut dyn TableView) -> usize {
        let index = self.records.len();
        self.records.push(record);
        log::trace!("[result_log] append: index={} uri={}", index, self.records[index].uri);
        view.row_inserted(index, &self.records[index]);
        index
    }

    /// Drop every record. Clearing an empty log does not notify the view.
    pub fn clear(&mut self, view: &mut dyn TableView) {
        if self.records.is_empty() {
            return;
        }
        log::debug!("[result_log] clear: dropped={}", self.records.len());
        self.records.clear();
        view.all_rows_cleared();
    }

    /// Point-in-time copy of the log in arrival order
    pub fn snapshot(&self) -> Vec<ResultRecord> {
        self.records.clone()
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn get(&self, row: usize) -> Option<&ResultRecord> {
        self.records.get(row)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records every notification it receives
    #[derive(Debug, Default)]
    pub(crate) struct RecordingView {
        pub inserted: Vec<usize>,
        pub cleared: usize,
    }

    impl TableView for RecordingView {
        fn row_inserted(&mut self, index: usize, _record: &ResultRecord) {
            self.inserted.push(index);
        }

        fn all_rows_cleared(&mut self) {
            self.cleared += 1;
        }
    }

    fn record(uri: &str) -> ResultRecord {
        ResultRecord::new(uri, "GET", "", false)
    }

    #[test]
    fn test_append_preserves_arrival_order() {
        let mut log = ResultLog::new();
        let mut view = RecordingView::default();
        let uris = ["http://a/3", "http://a/1", "http://a/2"];

        for uri in uris {
            log.append(record(uri), &mut view);
        }

        let snapshot: Vec<String> = log.snapshot().into_iter().map(|r| r.uri).collect();
        assert_eq!(snapshot, uris);
        assert_eq!(view.inserted, vec![0, 1, 2]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut log = ResultLog::new();
        let mut view = RecordingView::default();

        log.append(record("http://a/x"), &mut view);
        log.append(record("http://a/x"), &mut view);

        assert_eq!(log.len(), 2);
        assert_eq!(log.get(0), log.get(1));
    }

    #[test]
    fn test_clear_empties_log_and_notifies() {
        let mut log = ResultLog::new();
        let mut view = RecordingView::default();
        log.append(record("http://a/1"), &mut view);

        log.clear(&mut view);

        assert!(log.snapshot().is_empty());
        assert!(log.is_empty());
        assert_eq!(view.cleared, 1);
    }

    #[test]
    fn test_clear_on_empty_log_is_noop() {
        let mut log = ResultLog::new();
        let mut view = RecordingView::default();

        log.clear(&mut view);
        log.clear(&mut view);

        assert!(log.is_empty());
        assert_eq!(view.cleared, 0);
    }

    #[test]
    fn test_rows_addressable_by_index() {
        let mut log = ResultLog::new();
        let mut view = RecordingView::default();
        log.append(record("http://a/1"), &mut view);
        log.append(ResultRecord::new("http://b/", "GET", "out of scope", true), &mut view);

        assert_eq!(log.get(1).map(|r| r.flags.as_str()), Some("out of scope"));
        assert!(log.get(2).is_none());
    }

    #[test]
    fn test_snapshot_is_point_in_time() {
        let mut log = ResultLog::new();
        let mut view = RecordingView::default();
        log.append(record("http://a/1"), &mut view);

        let before = log.snapshot();
        log.append(record("http://a/2"), &mut view);

        assert_eq!(before.len(), 1);
        assert_eq!(log.snapshot().len(), 2);
    }
}
