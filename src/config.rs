use std::time::Duration;

pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_THREAD_COUNT: usize = 2;
pub const DEFAULT_MAX_PAGES: usize = 0;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = "spider-panel/0.1";
pub const DEFAULT_REFRESH_RATE_MS: u64 = 250;

/// Options handed to every crawl worker
#[derive(Debug, Clone, PartialEq)]
pub struct SpiderParams {
    /// Link depth followed from the start URL; the start URL itself is depth 0
    pub max_depth: usize,
    /// Concurrent fetches per crawl
    pub thread_count: usize,
    /// Stop after this many fetched pages; 0 means no limit
    pub max_pages: usize,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub include_subdomains: bool,
}

impl SpiderParams {
    /// Clamp values a crawl cannot run with
    pub fn sanitized(mut self) -> Self {
        if self.thread_count == 0 {
            log::warn!("[config] thread_count=0 is not usable, using 1");
            self.thread_count = 1;
        }
        if self.request_timeout.is_zero() {
            log::warn!("[config] request_timeout=0 is not usable, using {}s", DEFAULT_REQUEST_TIMEOUT_SECS);
            self.request_timeout = Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS);
        }
        self
    }

    pub fn page_limit_reached(&self, fetched: usize) -> bool {
        self.max_pages > 0 && fetched >= self.max_pages
    }
}

impl Default for SpiderParams {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            thread_count: DEFAULT_THREAD_COUNT,
            max_pages: DEFAULT_MAX_PAGES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            include_subdomains: false,
        }
    }
}
