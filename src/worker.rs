use async_trait::async_trait;
use eyre::Result;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::site::Site;
use crate::types::{ResultRecord, ScanProgress, WorkerEvent};

/// Posting side of the controller's event queue, bound to one session.
///
/// Every method is fire-and-forget: sending never blocks and a dropped controller is not an
/// error for the worker.
#[derive(Debug, Clone)]
pub struct WorkerReporter {
    session: u64,
    tx: UnboundedSender<WorkerEvent>,
}

impl WorkerReporter {
    pub fn new(session: u64, tx: UnboundedSender<WorkerEvent>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn discovered(&self, uri: &str, method: &str, flags: &str, skipped: bool) {
        self.post(WorkerEvent::Discovered {
            session: self.session,
            record: ResultRecord::new(uri, method, flags, skipped),
        });
    }

    pub fn progress(&self, fetched: usize, discovered: usize) {
        self.post(WorkerEvent::Progress {
            session: self.session,
            progress: ScanProgress { fetched, discovered },
        });
    }

    pub(crate) fn completed(&self, site: &str) {
        self.post(WorkerEvent::Completed {
            session: self.session,
            site: site.to_string(),
        });
    }

    fn post(&self, event: WorkerEvent) {
        if self.tx.send(event).is_err() {
            log::trace!("[worker] post_dropped: session={} reason=receiver_closed", self.session);
        }
    }
}

/// A crawl against one site. Implementations report what they find through the reporter and
/// return when the crawl is exhausted or `cancel` fires.
#[async_trait]
pub trait CrawlWorker: Send + Sync {
    /// Worker identifier for logging
    fn name(&self) -> &'static str;

    /// Perform the crawl. Completion is reported by the driver, not by the worker.
    async fn crawl(&self, site: &Site, reporter: &WorkerReporter, cancel: &CancellationToken) -> Result<()>;
}

/// Creates one worker per session
pub trait CrawlWorkerFactory: Send + Sync {
    fn create(&self, site: &Site) -> Box<dyn CrawlWorker>;
}

/// Run `worker` on `runtime` and report completion once it returns, fails or panics.
///
/// A worker that never returns never reports completion.
pub fn spawn_worker(
    runtime: &Handle,
    worker: Box<dyn CrawlWorker>,
    site: Site,
    reporter: WorkerReporter,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let name = worker.name();
    let site_name = site.name.clone();
    let session = reporter.session();
    let crawl_reporter = reporter.clone();

    log::debug!("[worker] spawn: worker={} session={} site={}", name, session, site_name);

    let crawl = runtime.spawn(async move {
        worker.crawl(&site, &crawl_reporter, &cancel).await
    });

    runtime.spawn(async move {
        let started = Instant::now();
        match crawl.await {
            Ok(Ok(())) => {
                log::info!("[worker] crawl_finished: worker={} session={} site={} duration={}ms",
                    name, session, site_name, started.elapsed().as_millis());
            }
            Ok(Err(error)) => {
                log::error!("[worker] crawl_failed: worker={} session={} site={} duration={}ms error={:#}",
                    name, session, site_name, started.elapsed().as_millis(), error);
            }
            Err(join_error) => {
                log::error!("[worker] crawl_aborted: worker={} session={} site={} error={}",
                    name, session, site_name, join_error);
            }
        }
        reporter.completed(&site_name);
    })
}
