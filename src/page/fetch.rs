// src/page/fetch.rs
// =============================================================================
// This module downloads pages for the crawl workers.
//
// Key functionality:
// - Makes HTTP GET requests with a timeout and a bounded number of redirects
// - Only hands back pages that are HTML and still on the crawled host after
//   redirects
// - Treats every failure (timeout, DNS, 404, 500, ...) as "nothing to crawl"
//
// The Fetcher trait is what the coordinator depends on. HttpFetcher is the
// real implementation; tests plug in an in-memory one.
// =============================================================================

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client};
use tracing::debug;

use crate::config::CrawlConfig;
use crate::crawl::host_key;
use crate::error::CrawlError;

const MAX_REDIRECTS: usize = 10;

// A successfully fetched HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// The URL the page was actually served from, after following redirects
    pub final_url: String,
    /// The HTML body
    pub body: String,
}

// Anything that can turn a URL into a page.
//
// Returns None when there is nothing to process: the request failed, or the
// response was filtered out (off-site redirect, not HTML). Callers must treat
// both cases the same way.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<FetchedPage>;
}

// Fetches pages over HTTP with reqwest.
//
// Each crawl worker owns one of these. The client's connection pool is
// released when the fetcher is dropped at the end of the worker's life.
pub struct HttpFetcher {
    client: Client,
    allowed_host: String,
}

impl HttpFetcher {
    pub fn new(allowed_host: impl Into<String>, config: &CrawlConfig) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            allowed_host: allowed_host.into(),
        })
    }

    // Does the actual request. Network errors come back as Err, filtered
    // responses as Ok(None).
    async fn try_fetch(&self, url: &str) -> Result<Option<FetchedPage>, reqwest::Error> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!("Skipping {}: HTTP {}", url, status.as_u16());
            return Ok(None);
        }

        // Redirects may have taken us to another site
        let final_url = response.url().to_string();
        if host_key(&final_url).as_deref() != Some(self.allowed_host.as_str()) {
            debug!("Skipping external URL: {} (redirected from {})", final_url, url);
            return Ok(None);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_html(&content_type) {
            debug!("Skipping non-HTML content: {} ({})", final_url, content_type);
            return Ok(None);
        }

        let body = response.text().await?;
        Ok(Some(FetchedPage { final_url, body }))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<FetchedPage> {
        debug!("Fetching URL: {}", url);
        match self.try_fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                debug!("Failed to fetch {}: {}", url, describe_error(&e));
                None
            }
        }
    }
}

// Checks the media type part of a Content-Type header,
// e.g. "text/html; charset=utf-8" -> "text/html"
fn is_html(content_type: &str) -> bool {
    let media_type = content_type.split(';').next().unwrap_or("").trim();
    media_type.eq_ignore_ascii_case("text/html")
        || media_type.eq_ignore_ascii_case("application/xhtml+xml")
}

// Turns a reqwest error into a short description for the debug log
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() {
        format!("connection failed ({})", error)
    } else {
        error.to_string()
    }
}
