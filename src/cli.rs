use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    SpiderParams, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES, DEFAULT_REFRESH_RATE_MS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_THREAD_COUNT, DEFAULT_USER_AGENT,
};

#[derive(Debug, Parser)]
#[command(name = "spider-panel")]
#[command(about = "Crawl a site and watch discovered URLs stream in")]
pub struct Cli {
    /// Sites to offer for crawling (domain, host:port or URL)
    #[arg(required = true)]
    pub sites: Vec<String>,

    /// Maximum link depth followed from the start URL
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub depth: usize,

    /// Concurrent fetches
    #[arg(long, default_value_t = DEFAULT_THREAD_COUNT)]
    pub threads: usize,

    /// Stop after this many fetched pages (0 = unlimited)
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Treat subdomains of the site as in scope
    #[arg(long)]
    pub subdomains: bool,

    /// Refresh rate in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_REFRESH_RATE_MS)]
    pub refresh_rate: u64,

    /// Disable TUI mode: crawl the first site and print results
    #[arg(long)]
    pub no_tui: bool,

    /// Write the final results as JSON when the program exits
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn spider_params(&self) -> SpiderParams {
        SpiderParams {
            max_depth: self.depth,
            thread_count: self.threads,
            max_pages: self.max_pages,
            request_timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
            include_subdomains: self.subdomains,
        }
        .sanitized()
    }

    pub fn refresh_rate(&self) -> Duration {
        Duration::from_millis(self.refresh_rate.max(1))
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
