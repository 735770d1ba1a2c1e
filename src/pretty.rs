use crate::controller::RenderingSurface;
use crate::result_log::{ResultLog, TableView};
use crate::types::{ResultRecord, ScanProgress};
use eyre::{Result, WrapErr};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const SEPARATOR_WIDTH: usize = 80;
const METHOD_COLUMN_WIDTH: usize = 7;

/// Rendering surface that streams rows to a writer, used when the TUI is disabled
pub struct ConsoleSurface<W: Write> {
    out: W,
    show_progress: bool,
}

impl ConsoleSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out, show_progress: false }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{}", line) {
            log::warn!("[pretty] write_failed: error={}", e);
        }
    }
}

impl<W: Write> TableView for ConsoleSurface<W> {
    fn row_inserted(&mut self, index: usize, record: &ResultRecord) {
        let line = format_record(index, record);
        self.emit(&line);
    }

    fn all_rows_cleared(&mut self) {
        self.emit(&"─".repeat(SEPARATOR_WIDTH));
    }
}

impl<W: Write> RenderingSurface for ConsoleSurface<W> {
    fn selection_enabled_changed(&mut self, enabled: bool) {
        log::debug!("[pretty] selection_enabled_changed: enabled={}", enabled);
    }

    fn progress_changed(&mut self, site: &str, progress: ScanProgress) {
        if self.show_progress {
            let line = format!("  … {}: {} fetched, {} discovered", site, progress.fetched, progress.discovered);
            self.emit(&line);
        }
    }
}

/// One result row as a single line: `#index  processed  METHOD  uri  [flags]`
pub fn format_record(index: usize, record: &ResultRecord) -> String {
    let icon = if record.processed() { "✅" } else { "⏭️" };
    let mut line = format!("{:>5} {} {:<width$} {}",
        index + 1, icon, record.method, record.uri, width = METHOD_COLUMN_WIDTH);
    if !record.flags.is_empty() {
        line.push_str(&format!("  [{}]", record.flags));
    }
    line
}

/// Closing summary for a finished session
pub fn print_summary(site: &str, log: &ResultLog) {
    let skipped = log.records().iter().filter(|r| r.skipped).count();
    println!("{}", "─".repeat(SEPARATOR_WIDTH));
    println!("🕷️  {}: {} results ({} fetched, {} skipped)",
        site, log.len(), log.len() - skipped, skipped);
}

/// Write records as a pretty-printed JSON array
pub fn write_json(path: &Path, records: &[ResultRecord]) -> Result<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)
        .wrap_err("Failed to serialize results")?;
    writer.flush().wrap_err("Failed to write results")?;
    log::info!("[pretty] write_json: path={} records={}", path.display(), records.len());
    Ok(())
}
