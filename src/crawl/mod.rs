// src/crawl/mod.rs
// =============================================================================
// This module handles the crawl itself.
//
// Submodules:
// - normalize:   turns URLs into a canonical string form for comparisons
// - frontier:    the shared queue of URLs still to crawl, plus everything seen
// - store:       the bounded map of crawled page -> links found on it
// - coordinator: spawns the workers and decides when the crawl is over
//
// Fetching pages and pulling links out of HTML live in the page module.
// =============================================================================

mod coordinator;
mod frontier;
mod normalize;
mod store;

pub use coordinator::crawl;
pub use normalize::{host_key, normalize_url};
pub use store::PageRecord;
