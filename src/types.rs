use serde::Serialize;

/// One discovered-resource report from the crawl worker.
///
/// Records are never mutated after they are appended to the result log; identity is the
/// row index, so the same URI may legitimately appear more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub uri: String,
    pub method: String,
    pub flags: String,
    pub skipped: bool,
}

impl ResultRecord {
    pub fn new(
        uri: impl Into<String>,
        method: impl Into<String>,
        flags: impl Into<String>,
        skipped: bool,
    ) -> Self {
        Self {
            uri: uri.into(),
            method: method.into(),
            flags: flags.into(),
            skipped,
        }
    }

    /// Whether the resource was actually fetched by the worker
    pub fn processed(&self) -> bool {
        !self.skipped
    }
}

/// Correlates one start request with the worker events it produces
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    pub id: u64,
    pub site: String,
}

/// Latest progress reported by a crawl worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanProgress {
    pub fetched: usize,
    pub discovered: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Idle,
    Running,
    Stopping,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Idle => "idle",
            ScanStatus::Running => "running",
            ScanStatus::Stopping => "stopping",
        }
    }
}

/// Messages posted by a crawl worker to the controller's event queue.
///
/// The worker only ever posts these; all state they affect is mutated on the thread that
/// owns the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Discovered {
        session: u64,
        record: ResultRecord,
    },
    Progress {
        session: u64,
        progress: ScanProgress,
    },
    Completed {
        session: u64,
        site: String,
    },
}

impl WorkerEvent {
    pub fn session(&self) -> u64 {
        match self {
            WorkerEvent::Discovered { session, .. }
            | WorkerEvent::Progress { session, .. }
            | WorkerEvent::Completed { session, .. } => *session,
        }
    }
}
