use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::result_log::{ResultLog, TableView};
use crate::site::SiteRegistry;
use crate::types::{ResultRecord, ScanProgress, ScanStatus, SessionHandle, WorkerEvent};
use crate::worker::{spawn_worker, CrawlWorkerFactory, WorkerReporter};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StartError {
    #[error("site must not be empty")]
    EmptySite,
    #[error("unknown site: {0}")]
    UnknownSite(String),
    #[error("no site selected")]
    NoSiteSelected,
}

/// Outbound contract to whatever presents the panel
pub trait RenderingSurface: TableView {
    /// Target selection was enabled or disabled
    fn selection_enabled_changed(&mut self, enabled: bool);

    /// The active session reported progress
    fn progress_changed(&mut self, _site: &str, _progress: ScanProgress) {}

    /// A result row was picked (or the pick was cleared)
    fn select_row(&mut self, _row: Option<usize>) {}
}

/// One start-to-completion run against one site
#[derive(Debug)]
struct ScanSession {
    handle: SessionHandle,
    cancel: CancellationToken,
    progress: ScanProgress,
    worker: JoinHandle<()>,
}

/// Gates crawl sessions so that at most one is active, and keeps target selection in step.
///
/// Lives on the thread that owns the rendering surface. Workers post [`WorkerEvent`]s into the
/// controller's queue; [`ScanController::process_pending_events`] or
/// [`ScanController::run_until_idle`] apply them on that thread.
pub struct ScanController<S: RenderingSurface> {
    registry: SiteRegistry,
    factory: Box<dyn CrawlWorkerFactory>,
    runtime: Handle,
    log: ResultLog,
    surface: S,
    selection_enabled: bool,
    selected_site: Option<String>,
    session: Option<ScanSession>,
    next_session_id: u64,
    events_tx: UnboundedSender<WorkerEvent>,
    events_rx: UnboundedReceiver<WorkerEvent>,
}

impl<S: RenderingSurface> ScanController<S> {
    pub fn new(
        registry: SiteRegistry,
        factory: Box<dyn CrawlWorkerFactory>,
        surface: S,
        runtime: Handle,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let selected_site = registry.sites().first().map(|s| s.name.clone());
        log::debug!("[controller] new: sites={} selected={:?}", registry.len(), selected_site);

        Self {
            registry,
            factory,
            runtime,
            log: ResultLog::new(),
            surface,
            selection_enabled: true,
            selected_site,
            session: None,
            next_session_id: 1,
            events_tx,
            events_rx,
        }
    }

    /// Start a crawl against `site`.
    ///
    /// Returns `Ok(None)` without touching any state when a session is already active.
    pub fn request_start(&mut self, site: &str) -> Result<Option<SessionHandle>, StartError> {
        if let Some(active) = &self.session {
            log::debug!("[controller] start_ignored: requested={} active={} session={}",
                site, active.handle.site, active.handle.id);
            return Ok(None);
        }

        if site.trim().is_empty() {
            return Err(StartError::EmptySite);
        }
        let target = self.registry.resolve(site)
            .ok_or_else(|| StartError::UnknownSite(site.to_string()))?
            .clone();

        self.log.clear(&mut self.surface);
        self.set_selection_enabled(false);
        self.selected_site = Some(target.name.clone());

        log::info!("[controller] start: starting spider scan by user request on site: {}", target.name);

        let handle = SessionHandle {
            id: self.next_session_id,
            site: target.name.clone(),
        };
        self.next_session_id += 1;

        let cancel = CancellationToken::new();
        let worker = self.factory.create(&target);
        let reporter = WorkerReporter::new(handle.id, self.events_tx.clone());
        let join = spawn_worker(&self.runtime, worker, target, reporter, cancel.clone());

        self.session = Some(ScanSession {
            handle: handle.clone(),
            cancel,
            progress: ScanProgress::default(),
            worker: join,
        });

        Ok(Some(handle))
    }

    /// Start a crawl against the currently selected site
    pub fn start_selected(&mut self) -> Result<Option<SessionHandle>, StartError> {
        let site = self.selected_site.clone().ok_or(StartError::NoSiteSelected)?;
        self.request_start(&site)
    }

    /// Ask the active worker to stop. The session stays active until the worker reports
    /// completion. Returns false when there is nothing to stop.
    pub fn request_stop(&mut self) -> bool {
        match &self.session {
            Some(session) if !session.cancel.is_cancelled() => {
                log::info!("[controller] stop: site={} session={}", session.handle.site, session.handle.id);
                session.cancel.cancel();
                true
            }
            Some(session) => {
                log::debug!("[controller] stop_ignored: session={} reason=already_stopping", session.handle.id);
                false
            }
            None => false,
        }
    }

    /// Append a discovery to the result log. Empty URIs are rejected.
    pub fn on_worker_discovered(&mut self, uri: &str, method: &str, flags: &str, skipped: bool) -> Option<usize> {
        if uri.trim().is_empty() {
            log::warn!("[controller] discovery_rejected: reason=empty_uri method={} flags={}", method, flags);
            return None;
        }
        let record = ResultRecord::new(uri, method, flags, skipped);
        Some(self.log.append(record, &mut self.surface))
    }

    /// End the active session and re-enable target selection. Safe to call when idle.
    pub fn on_worker_completed(&mut self, site: &str) {
        match self.session.take() {
            Some(session) => {
                log::info!("[controller] completed: site={} session={} results={} fetched={}",
                    site, session.handle.id, self.log.len(), session.progress.fetched);
            }
            None => {
                log::debug!("[controller] completed_while_idle: site={}", site);
            }
        }
        self.set_selection_enabled(true);
    }

    /// Whether any session is active. `site` and `strict_match` are deliberately ignored:
    /// two crawls cannot share the storage a worker writes through.
    pub fn is_scan_active(&self, site: &str, strict_match: bool) -> bool {
        log::trace!("[controller] is_scan_active: site={} strict_match={} active={}",
            site, strict_match, self.session.is_some());
        self.session.is_some()
    }

    /// Multiple scan views are not supported; always a successful no-op
    pub fn request_switch_view(&mut self, site: &str) {
        log::trace!("[controller] switch_view: site={} (single view)", site);
    }

    /// Change the selected site. Ignored while target selection is disabled.
    pub fn on_site_selected(&mut self, site: &str) -> bool {
        if !self.selection_enabled {
            log::debug!("[controller] site_select_ignored: site={} reason=selection_disabled", site);
            return false;
        }
        let Some(name) = self.registry.resolve(site).map(|s| s.name.clone()) else {
            log::warn!("[controller] site_select_ignored: site={} reason=unknown_site", site);
            return false;
        };
        self.request_switch_view(&name);
        self.selected_site = Some(name);
        true
    }

    /// Route a row pick to the surface. Out-of-range rows clear the selection.
    pub fn on_right_click(&mut self, row: Option<usize>) -> Option<&ResultRecord> {
        let row = row.filter(|r| *r < self.log.len());
        self.surface.select_row(row);
        row.and_then(|r| self.record(r))
    }

    /// Apply one worker event. Events from any session other than the active one are dropped,
    /// completions included: a late completion must not end a newer session.
    pub fn dispatch(&mut self, event: WorkerEvent) {
        let current = self.session.as_ref().map(|s| s.handle.id);
        if current != Some(event.session()) {
            log::debug!("[controller] stale_event: session={} current={:?} event={:?}",
                event.session(), current, event);
            return;
        }

        match event {
            WorkerEvent::Discovered { record, .. } => {
                self.on_worker_discovered(&record.uri, &record.method, &record.flags, record.skipped);
            }
            WorkerEvent::Progress { progress, .. } => {
                if let Some(active) = self.session.as_mut() {
                    active.progress = progress;
                    self.surface.progress_changed(&active.handle.site, progress);
                }
            }
            WorkerEvent::Completed { site, .. } => self.on_worker_completed(&site),
        }
    }

    /// Apply every event already queued, without waiting. Returns how many were applied.
    pub fn process_pending_events(&mut self) -> usize {
        self.process_pending_events_up_to(usize::MAX)
    }

    /// Apply at most `limit` queued events, leaving the rest for the next call
    pub fn process_pending_events_up_to(&mut self, limit: usize) -> usize {
        let mut applied = 0;
        while applied < limit {
            match self.events_rx.try_recv() {
                Ok(event) => {
                    self.dispatch(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if applied > 0 {
            log::trace!("[controller] processed_events: count={} limit={}", applied, limit);
        }
        applied
    }

    /// Apply events as they arrive until no session is active
    pub async fn run_until_idle(&mut self) {
        while self.session.is_some() {
            match self.events_rx.recv().await {
                Some(event) => self.dispatch(event),
                None => break,
            }
        }
    }

    pub fn status(&self) -> ScanStatus {
        match &self.session {
            None => ScanStatus::Idle,
            Some(session) if session.cancel.is_cancelled() => ScanStatus::Stopping,
            Some(_) => ScanStatus::Running,
        }
    }

    pub fn active_session(&self) -> Option<&SessionHandle> {
        self.session.as_ref().map(|s| &s.handle)
    }

    pub fn progress(&self) -> Option<ScanProgress> {
        self.session.as_ref().map(|s| s.progress)
    }

    pub fn selection_enabled(&self) -> bool {
        self.selection_enabled
    }

    pub fn selected_site(&self) -> Option<&str> {
        self.selected_site.as_deref()
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    pub fn log(&self) -> &ResultLog {
        &self.log
    }

    /// The record behind a result row, addressed by arrival index
    pub fn record(&self, row: usize) -> Option<&ResultRecord> {
        self.log.get(row)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn set_selection_enabled(&mut self, enabled: bool) {
        if self.selection_enabled == enabled {
            return;
        }
        log::debug!("[controller] selection_enabled: {} -> {}", self.selection_enabled, enabled);
        self.selection_enabled = enabled;
        self.surface.selection_enabled_changed(enabled);
    }
}

impl<S: RenderingSurface> Drop for ScanController<S> {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            log::debug!("[controller] drop: cancelling session={} site={} worker_finished={}",
                session.handle.id, session.handle.site, session.worker.is_finished());
            session.cancel.cancel();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::worker::tests::ScriptedFactory;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub inserted: Vec<usize>,
        pub cleared: usize,
        pub selection_changes: Vec<bool>,
        pub progress: Vec<ScanProgress>,
        pub selected_row: Option<usize>,
    }

    impl TableView for RecordingSurface {
        fn row_inserted(&mut self, index: usize, _record: &ResultRecord) {
            self.inserted.push(index);
        }

        fn all_rows_cleared(&mut self) {
            self.cleared += 1;
        }
    }

    impl RenderingSurface for RecordingSurface {
        fn selection_enabled_changed(&mut self, enabled: bool) {
            self.selection_changes.push(enabled);
        }

        fn progress_changed(&mut self, _site: &str, progress: ScanProgress) {
            self.progress.push(progress);
        }

        fn select_row(&mut self, row: Option<usize>) {
            self.selected_row = row;
        }
    }

    fn registry() -> SiteRegistry {
        SiteRegistry::from_inputs(&["example.com", "other.org"]).unwrap()
    }

    fn controller(factory: ScriptedFactory) -> ScanController<RecordingSurface> {
        ScanController::new(registry(), Box::new(factory), RecordingSurface::default(), Handle::current())
    }

    fn records() -> Vec<ResultRecord> {
        vec![
            ResultRecord::new("http://example.com/a", "GET", "", false),
            ResultRecord::new("http://example.com/b", "GET", "redirect", true),
        ]
    }

    #[tokio::test]
    async fn test_full_session_lifecycle() {
        let mut controller = controller(ScriptedFactory::new(records()));

        let handle = controller.request_start("example.com").unwrap().unwrap();
        assert_eq!(handle.site, "example.com");
        assert!(!controller.selection_enabled());
        assert_eq!(controller.status(), ScanStatus::Running);

        controller.run_until_idle().await;

        assert_eq!(controller.log().snapshot(), records());
        assert!(controller.selection_enabled());
        assert_eq!(controller.status(), ScanStatus::Idle);
        assert_eq!(controller.surface().selection_changes, vec![false, true]);
        assert_eq!(controller.surface().inserted, vec![0, 1]);
        assert_eq!(controller.surface().progress.last().map(|p| p.fetched), Some(2));
    }

    #[tokio::test]
    async fn test_second_start_while_active_is_ignored() {
        let gate = Arc::new(Notify::new());
        let factory = ScriptedFactory::gated(records(), gate.clone());
        let created = factory.created.clone();
        let mut controller = controller(factory);

        let first = controller.request_start("example.com").unwrap().unwrap();
        tokio::task::yield_now().await;
        controller.process_pending_events();
        let rows_before = controller.log().snapshot();

        assert_eq!(controller.request_start("example.com"), Ok(None));
        assert_eq!(controller.request_start("other.org"), Ok(None));

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(controller.active_session(), Some(&first));
        assert_eq!(controller.log().snapshot(), rows_before);
        assert!(!controller.selection_enabled());

        gate.notify_one();
        controller.run_until_idle().await;
        assert!(controller.selection_enabled());
    }

    #[tokio::test]
    async fn test_activity_check_is_not_scoped_to_site() {
        let gate = Arc::new(Notify::new());
        let mut controller = controller(ScriptedFactory::gated(Vec::new(), gate.clone()));
        assert!(!controller.is_scan_active("other.org", false));

        controller.request_start("example.com").unwrap();

        assert!(controller.is_scan_active("example.com", true));
        assert!(controller.is_scan_active("other.org", true));
        assert!(controller.is_scan_active("unregistered.net", false));

        gate.notify_one();
        controller.run_until_idle().await;
        assert!(!controller.is_scan_active("example.com", true));
    }

    #[tokio::test]
    async fn test_start_validates_site() {
        let mut controller = controller(ScriptedFactory::new(Vec::new()));

        assert_eq!(controller.request_start("  "), Err(StartError::EmptySite));
        assert_eq!(controller.request_start("missing.net"), Err(StartError::UnknownSite("missing.net".to_string())));
        assert!(controller.selection_enabled());
        assert!(controller.active_session().is_none());
    }

    #[tokio::test]
    async fn test_start_clears_previous_results() {
        let mut controller = controller(ScriptedFactory::new(records()));
        controller.request_start("example.com").unwrap();
        controller.run_until_idle().await;
        assert_eq!(controller.log().len(), 2);

        controller.request_start("other.org").unwrap();
        assert!(controller.log().is_empty());
        assert_eq!(controller.surface().cleared, 1);

        controller.run_until_idle().await;
        assert_eq!(controller.log().len(), 2);
    }

    #[tokio::test]
    async fn test_stop_routes_through_completion() {
        let gate = Arc::new(Notify::new());
        let mut controller = controller(ScriptedFactory::gated(Vec::new(), gate));
        controller.request_start("example.com").unwrap();

        assert!(controller.request_stop());
        assert_eq!(controller.status(), ScanStatus::Stopping);
        assert!(!controller.request_stop());
        assert!(!controller.selection_enabled());

        controller.run_until_idle().await;
        assert_eq!(controller.status(), ScanStatus::Idle);
        assert!(controller.selection_enabled());
        assert!(!controller.request_stop());
    }

    #[tokio::test]
    async fn test_completion_with_no_discoveries() {
        let mut controller = controller(ScriptedFactory::new(Vec::new()));
        controller.request_start("example.com").unwrap();
        controller.run_until_idle().await;

        assert!(controller.log().is_empty());
        assert!(controller.selection_enabled());
    }

    #[tokio::test]
    async fn test_completion_is_idempotent() {
        let mut controller = controller(ScriptedFactory::new(Vec::new()));

        controller.on_worker_completed("example.com");
        controller.on_worker_completed("example.com");

        assert!(controller.selection_enabled());
        assert!(controller.surface().selection_changes.is_empty());
    }

    #[tokio::test]
    async fn test_empty_uri_rejected() {
        let mut controller = controller(ScriptedFactory::new(Vec::new()));

        assert_eq!(controller.on_worker_discovered("", "GET", "", false), None);
        assert_eq!(controller.on_worker_discovered("http://example.com/", "GET", "", false), Some(0));
        assert_eq!(controller.log().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_events_are_dropped() {
        let mut controller = controller(ScriptedFactory::new(Vec::new()));

        controller.dispatch(WorkerEvent::Discovered {
            session: 42,
            record: ResultRecord::new("http://example.com/old", "GET", "", false),
        });
        controller.dispatch(WorkerEvent::Progress { session: 42, progress: ScanProgress::default() });

        assert!(controller.log().is_empty());
        assert!(controller.surface().progress.is_empty());
    }

    #[tokio::test]
    async fn test_late_completion_does_not_end_newer_session() {
        let gate = Arc::new(Notify::new());
        let factory = ScriptedFactory::gated(Vec::new(), gate.clone());
        let created = factory.created.clone();
        let mut controller = controller(factory);

        let first = controller.request_start("example.com").unwrap().unwrap();
        controller.on_worker_completed("example.com");
        let second = controller.request_start("other.org").unwrap().unwrap();

        controller.dispatch(WorkerEvent::Completed { session: first.id, site: first.site.clone() });

        assert_eq!(controller.active_session(), Some(&second));
        assert!(!controller.selection_enabled());
        assert_eq!(controller.request_start("example.com"), Ok(None));
        assert_eq!(created.load(Ordering::SeqCst), 2);

        controller.request_stop();
        controller.run_until_idle().await;
        assert_eq!(controller.status(), ScanStatus::Idle);
    }

    #[tokio::test]
    async fn test_drop_cancels_active_worker() {
        let gate = Arc::new(Notify::new());
        let mut controller = controller(ScriptedFactory::gated(Vec::new(), gate));
        controller.request_start("example.com").unwrap();

        let session = controller.session.as_mut().unwrap();
        let cancel = session.cancel.clone();
        let driver = std::mem::replace(&mut session.worker, tokio::spawn(async {}));

        drop(controller);

        assert!(cancel.is_cancelled());
        tokio::time::timeout(std::time::Duration::from_secs(5), driver)
            .await
            .expect("gated worker should return once cancelled")
            .unwrap();
    }

    #[tokio::test]
    async fn test_capped_pump_leaves_remaining_events_queued() {
        let mut controller = controller(ScriptedFactory::new(records()));
        controller.request_start("example.com").unwrap();
        let id = controller.active_session().unwrap().id;
        for record in records() {
            controller.events_tx.send(WorkerEvent::Discovered { session: id, record }).unwrap();
        }

        assert_eq!(controller.process_pending_events_up_to(1), 1);
        assert_eq!(controller.log().len(), 1);
        controller.process_pending_events_up_to(2);
        assert_eq!(controller.log().len(), 2);

        controller.run_until_idle().await;
    }

    #[tokio::test]
    async fn test_site_selection_only_when_enabled() {
        let gate = Arc::new(Notify::new());
        let mut controller = controller(ScriptedFactory::gated(Vec::new(), gate.clone()));
        assert_eq!(controller.selected_site(), Some("example.com"));

        assert!(controller.on_site_selected("other.org"));
        assert_eq!(controller.selected_site(), Some("other.org"));
        assert!(!controller.on_site_selected("missing.net"));

        controller.start_selected().unwrap();
        assert!(!controller.on_site_selected("example.com"));
        assert_eq!(controller.selected_site(), Some("other.org"));

        gate.notify_one();
        controller.run_until_idle().await;
        assert!(controller.on_site_selected("example.com"));
    }

    #[tokio::test]
    async fn test_start_selected_without_sites() {
        let mut controller = ScanController::new(
            SiteRegistry::new(),
            Box::new(ScriptedFactory::new(Vec::new())),
            RecordingSurface::default(),
            Handle::current(),
        );
        assert_eq!(controller.start_selected(), Err(StartError::NoSiteSelected));
    }

    #[tokio::test]
    async fn test_right_click_addresses_rows() {
        let mut controller = controller(ScriptedFactory::new(Vec::new()));
        controller.on_worker_discovered("http://example.com/a", "GET", "", false);

        let uri = controller.on_right_click(Some(0)).map(|r| r.uri.clone());
        assert_eq!(uri.as_deref(), Some("http://example.com/a"));
        assert_eq!(controller.record(0).map(|r| r.uri.as_str()), Some("http://example.com/a"));
        assert!(controller.record(1).is_none());
        assert_eq!(controller.surface().selected_row, Some(0));

        assert!(controller.on_right_click(Some(5)).is_none());
        assert_eq!(controller.surface().selected_row, None);
    }

    #[tokio::test]
    async fn test_switch_view_is_noop() {
        let mut controller = controller(ScriptedFactory::new(Vec::new()));
        controller.request_switch_view("other.org");
        assert_eq!(controller.selected_site(), Some("example.com"));
        assert!(controller.selection_enabled());
    }
}
