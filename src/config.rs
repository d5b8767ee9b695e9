// src/config.rs
// =============================================================================
// Settings for one crawl run.
//
// The CLI (src/cli.rs) fills this in from command-line flags; tests build it
// directly with CrawlConfig::new() and the with_* helpers.
// =============================================================================

use std::time::Duration;

pub const DEFAULT_START_URL: &str = "https://monzo.com";
pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_MAX_PAGES: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = concat!("site-crawler/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Seed URL; its host is the only host the crawl will visit
    pub start_url: String,
    /// Number of concurrent worker tasks (at least 1 is always used)
    pub workers: usize,
    /// Maximum number of pages recorded before the crawl stops
    pub max_pages: usize,
    /// Per-request timeout, covering connect, redirects and body download
    pub timeout: Duration,
    /// Value of the User-Agent header sent with every request
    pub user_agent: String,
}

impl CrawlConfig {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            workers: DEFAULT_WORKERS,
            max_pages: DEFAULT_MAX_PAGES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[cfg(test)]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    // Zero workers would never finish, so we always run at least one
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::new(DEFAULT_START_URL)
    }
}
