pub mod links;

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::HashSet;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::SpiderParams;
use crate::site::Site;
use crate::worker::{CrawlWorker, CrawlWorkerFactory, WorkerReporter};

const MAX_REDIRECTS: usize = 10;
const METHOD_GET: &str = "GET";

pub const FLAG_OUT_OF_SCOPE: &str = "out of scope";
pub const FLAG_MAX_DEPTH: &str = "max depth";
pub const FLAG_MAX_PAGES: &str = "max pages";
pub const FLAG_REDIRECT: &str = "redirect";
pub const FLAG_ERROR: &str = "error";

/// Result of fetching one page
#[derive(Debug)]
struct FetchOutcome {
    url: Url,
    flags: String,
    links: Vec<Url>,
}

/// Breadth-first HTTP crawler bounded by depth, page count and concurrency
pub struct HttpSpider {
    client: Client,
    params: SpiderParams,
}

impl HttpSpider {
    pub fn new(params: SpiderParams) -> Result<Self> {
        let client = build_client(&params)?;
        Ok(Self::with_client(client, params))
    }

    pub fn with_client(client: Client, params: SpiderParams) -> Self {
        log::debug!("[spider] new: max_depth={} threads={} max_pages={} timeout={}ms",
            params.max_depth, params.thread_count, params.max_pages, params.request_timeout.as_millis());
        Self { client, params }
    }

    async fn fetch(&self, url: Url) -> FetchOutcome {
        let request_start = Instant::now();
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                log::debug!("[spider] fetch_failed: url={} duration={}ms error={}",
                    url, request_start.elapsed().as_millis(), e);
                return FetchOutcome { url, flags: FLAG_ERROR.to_string(), links: Vec::new() };
            }
        };

        let status = response.status();
        let final_url = response.url().clone();
        let html = links::is_html(
            response.headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );

        log::trace!("[spider] fetched: url={} status={} final_url={} duration={}ms",
            url, status.as_u16(), final_url, request_start.elapsed().as_millis());

        let flags = if !status.is_success() {
            format!("HTTP {}", status.as_u16())
        } else if links::normalize(final_url.clone()) != url {
            FLAG_REDIRECT.to_string()
        } else {
            String::new()
        };

        let links = if status.is_success() && html {
            match response.text().await {
                Ok(body) => links::extract_links(&final_url, &body),
                Err(e) => {
                    log::debug!("[spider] body_read_failed: url={} error={}", url, e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        FetchOutcome { url, flags, links }
    }
}

#[async_trait]
impl CrawlWorker for HttpSpider {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn crawl(&self, site: &Site, reporter: &WorkerReporter, cancel: &CancellationToken) -> Result<()> {
        log::info!("[spider] crawl_starting: site={} start_url={} session={}",
            site.name, site.start_url, reporter.session());

        let start = links::normalize(site.start_url.clone());
        let mut seen: HashSet<String> = HashSet::from([start.to_string()]);
        let mut frontier = vec![start];
        let mut fetched = 0usize;
        let mut discovered = 1usize;

        for depth in 0..=self.params.max_depth {
            if frontier.is_empty() {
                break;
            }

            let mut batch = std::mem::take(&mut frontier);
            if self.params.max_pages > 0 {
                let remaining = self.params.max_pages.saturating_sub(fetched);
                if batch.len() > remaining {
                    for url in batch.split_off(remaining) {
                        reporter.discovered(url.as_str(), METHOD_GET, FLAG_MAX_PAGES, true);
                    }
                }
            }
            if batch.is_empty() {
                break;
            }

            log::debug!("[spider] level_starting: site={} depth={} pages={}", site.name, depth, batch.len());

            let mut pages = stream::iter(batch)
                .map(|url| self.fetch(url))
                .buffer_unordered(self.params.thread_count.max(1));

            loop {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        log::info!("[spider] crawl_cancelled: site={} depth={} fetched={}", site.name, depth, fetched);
                        return Ok(());
                    }
                    next = pages.next() => match next {
                        Some(outcome) => outcome,
                        None => break,
                    },
                };

                fetched += 1;
                reporter.discovered(outcome.url.as_str(), METHOD_GET, &outcome.flags, false);

                for link in outcome.links {
                    if !seen.insert(link.to_string()) {
                        continue;
                    }
                    discovered += 1;

                    if !site.is_in_scope(&link, self.params.include_subdomains) {
                        reporter.discovered(link.as_str(), METHOD_GET, FLAG_OUT_OF_SCOPE, true);
                    } else if depth + 1 > self.params.max_depth {
                        reporter.discovered(link.as_str(), METHOD_GET, FLAG_MAX_DEPTH, true);
                    } else {
                        frontier.push(link);
                    }
                }

                reporter.progress(fetched, discovered);
            }
        }

        log::info!("[spider] crawl_exhausted: site={} fetched={} discovered={}", site.name, fetched, discovered);
        Ok(())
    }
}

/// Builds [`HttpSpider`]s that share one HTTP client
pub struct HttpSpiderFactory {
    client: Client,
    params: SpiderParams,
}

impl HttpSpiderFactory {
    pub fn new(params: SpiderParams) -> Result<Self> {
        let client = build_client(&params)?;
        Ok(Self { client, params })
    }
}

impl CrawlWorkerFactory for HttpSpiderFactory {
    fn create(&self, site: &Site) -> Box<dyn CrawlWorker> {
        log::debug!("[spider] create_worker: site={}", site.name);
        Box::new(HttpSpider::with_client(self.client.clone(), self.params.clone()))
    }
}

fn build_client(params: &SpiderParams) -> Result<Client> {
    Client::builder()
        .timeout(params.request_timeout)
        .user_agent(params.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .wrap_err("Failed to create HTTP client")
}
