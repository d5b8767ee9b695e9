// src/crawl/frontier.rs
// =============================================================================
// The frontier: the work queue shared by every crawl worker.
//
// It owns three pieces of state behind one mutex:
// - visited:   every canonical URL ever admitted (only ever grows)
// - pending:   admitted URLs waiting to be fetched, in FIFO order
// - in_flight: URLs handed to a worker that hasn't finished with them yet
//
// Because "is it visited?" and "add it to the queue" happen under the same
// lock, two workers discovering the same link at the same moment can never
// both enqueue it. The lock is never held across an .await.
//
// in_flight is what lets workers tell "the queue is empty right now" apart
// from "the queue is empty forever": a queue can only grow again while some
// worker is still processing a page.
// =============================================================================

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use url::Url;

use super::normalize::{host_key, normalize_url};
use crate::error::CrawlError;

pub struct Frontier {
    allowed_host: String,
    state: Mutex<FrontierState>,
    changed: Notify,
}

#[derive(Default)]
struct FrontierState {
    visited: HashSet<String>,
    pending: VecDeque<String>,
    in_flight: usize,
}

// What a worker gets when it asks for work
pub enum Checkout<'a> {
    /// A URL to crawl. Counts as in-flight until the guard is dropped.
    Claimed(InFlight<'a>),
    /// Nothing queued, but other workers may still add more
    Idle,
    /// Nothing queued and nothing in flight: the crawl has run out of work
    Exhausted,
}

// A URL checked out of the frontier.
//
// Dropping it marks the work as finished, so the in-flight count is released
// on every path out of a worker iteration, including a panic.
pub struct InFlight<'a> {
    frontier: &'a Frontier,
    url: String,
}

impl InFlight<'_> {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        {
            let mut state = self.frontier.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.frontier.changed.notify_waiters();
    }
}

impl Frontier {
    // Creates a frontier that only admits URLs whose host key equals
    // allowed_host (see normalize::host_key)
    pub fn new(allowed_host: impl Into<String>) -> Self {
        Self {
            allowed_host: allowed_host.into(),
            state: Mutex::new(FrontierState::default()),
            changed: Notify::new(),
        }
    }

    // Creates a frontier scoped to the seed URL's host, and queues the seed
    pub fn for_seed(seed: &str) -> Result<Self, CrawlError> {
        let invalid = |reason: String| CrawlError::InvalidSeed {
            url: seed.to_string(),
            reason,
        };

        let url = Url::parse(seed.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        let host = host_key(url.as_str()).ok_or_else(|| invalid("URL has no host".to_string()))?;

        let frontier = Self::new(host);
        frontier.add_url(url.as_str());
        Ok(frontier)
    }

    pub fn allowed_host(&self) -> &str {
        &self.allowed_host
    }

    // Whether a canonical URL is an http(s) URL on the crawled host
    pub fn is_in_scope(&self, url: &str) -> bool {
        let is_web = url.starts_with("http://") || url.starts_with("https://");
        is_web && host_key(url).as_deref() == Some(self.allowed_host.as_str())
    }

    // Queues a URL unless it is off-site or has been seen before.
    //
    // Returns true if the URL was admitted. Adding the same URL again (in any
    // spelling that normalizes the same way) is a no-op.
    pub fn add_url(&self, raw_url: &str) -> bool {
        let url = normalize_url(raw_url);
        if !self.is_in_scope(&url) {
            return false;
        }

        let admitted = {
            let mut state = self.lock();
            if state.visited.insert(url.clone()) {
                state.pending.push_back(url);
                true
            } else {
                false
            }
        };

        if admitted {
            self.changed.notify_waiters();
        }
        admitted
    }

    // Marks a URL as seen without queueing it, e.g. the final URL of a
    // redirect that was already fetched.
    //
    // Returns true if the URL had not been seen before.
    pub fn mark_visited(&self, raw_url: &str) -> bool {
        self.lock().visited.insert(normalize_url(raw_url))
    }

    // Removes and returns the oldest queued URL without waiting.
    //
    // This does not count the URL as in-flight; workers use checkout().
    #[cfg(test)]
    pub fn next_url(&self) -> Option<String> {
        self.lock().pending.pop_front()
    }

    // Atomically takes the next URL and marks it in-flight, or reports why
    // there is nothing to take
    pub fn checkout(&self) -> Checkout<'_> {
        let mut state = self.lock();
        match state.pending.pop_front() {
            Some(url) => {
                state.in_flight += 1;
                Checkout::Claimed(InFlight { frontier: self, url })
            }
            None if state.in_flight > 0 => Checkout::Idle,
            None => Checkout::Exhausted,
        }
    }

    // Resolves the next time a URL is admitted or in-flight work finishes.
    //
    // Create the future *before* calling checkout() so a change that happens
    // in between isn't missed.
    pub fn changed(&self) -> Notified<'_> {
        self.changed.notified()
    }

    // Snapshot only: another worker may change it right after this returns
    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    #[cfg(test)]
    pub fn in_flight_count(&self) -> usize {
        self.lock().in_flight
    }

    // Every critical section is a handful of collection operations that
    // cannot panic midway, so a poisoned lock still guards consistent data
    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
