// src/error.rs
// =============================================================================
// Errors that can stop a crawl from starting or from finishing cleanly.
//
// Most things that go wrong during a crawl are NOT errors: a page that times
// out, returns 404, redirects off-site or isn't HTML is simply skipped by the
// fetcher. Only the faults below are surfaced to main.rs, which turns them
// into a non-zero exit code.
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    /// The seed URL couldn't be parsed or has no host to scope the crawl to
    #[error("invalid start URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    /// The HTTP client for a worker couldn't be built
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// One or more workers crashed; the crawl was shut down early
    #[error("{0} crawl worker(s) failed")]
    WorkersFailed(usize),
}
