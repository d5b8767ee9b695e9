// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use clap's "derive" API: the CLI is described by a plain struct, and
// the attributes on each field become flags, defaults and help text.
//
// Example:
//   site-crawler --start-url https://example.com --workers 8 --max-pages 50
// =============================================================================

use std::num::NonZeroUsize;
use std::time::Duration;

use clap::Parser;

use crate::config::{CrawlConfig, DEFAULT_START_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};

#[derive(Parser, Debug)]
#[command(
    name = "site-crawler",
    version,
    about = "Crawl a single website and list the links found on each page",
    long_about = "site-crawler starts from one URL and crawls every page it can reach on the same \
                  host, using several concurrent workers. For each crawled page it prints the \
                  page URL and the same-site links found on it."
)]
pub struct Cli {
    /// The URL to start crawling from. Only pages on its host are crawled.
    #[arg(long, default_value = DEFAULT_START_URL)]
    pub start_url: String,

    /// Number of concurrent workers
    #[arg(long, default_value = "5")]
    pub workers: NonZeroUsize,

    /// Maximum number of pages to crawl
    #[arg(long, default_value = "10")]
    pub max_pages: NonZeroUsize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Output results as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Log every fetch and worker decision (same as RUST_LOG=debug)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            start_url: self.start_url.clone(),
            workers: self.workers.get(),
            max_pages: self.max_pages.get(),
            timeout: Duration::from_secs(self.timeout),
            user_agent: self.user_agent.clone(),
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why NonZeroUsize?
//    - Zero workers or a zero page limit would make a crawl that does nothing
//    - NonZeroUsize implements FromStr, so clap rejects "0" for us with a
//      normal usage error instead of us checking by hand
//
// 2. Why is the config a separate struct?
//    - The crawl code doesn't depend on clap at all
//    - Tests build a CrawlConfig directly without parsing any arguments
// -----------------------------------------------------------------------------
