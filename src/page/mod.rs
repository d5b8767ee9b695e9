// src/page/mod.rs
// =============================================================================
// This module deals with single pages.
//
// Submodules:
// - fetch: downloads a page over HTTP (only same-site HTML pages get through)
// - html:  extracts the links a page points to
//
// Neither knows anything about the rest of the crawl: they are given a URL
// or a document and hand back a result.
// =============================================================================

mod fetch;
mod html;

pub use fetch::{FetchedPage, Fetcher, HttpFetcher};
pub use html::extract_links;
