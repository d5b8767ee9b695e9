// src/page/html.rs
// =============================================================================
// This module extracts crawlable links from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever, which never fails on broken markup
//
// We also use the `url` crate to resolve relative links against the page URL.
//
// Only two kinds of href are followed:
// - absolute http:// and https:// links
// - links starting with "/" (root-relative "/docs" and scheme-relative
//   "//example.com/docs")
// Everything else (mailto:, tel:, javascript:, "#section", "page.html") is
// skipped.
// =============================================================================

use std::collections::BTreeSet;

use scraper::{Html, Selector};
use tracing::warn;
use url::Url;

use crate::crawl::normalize_url;

// Extracts all followable links from HTML content
//
// Parameters:
//   base_url: the URL the page was served from (after redirects)
//   html: the HTML content to parse
//
// Returns: the set of canonical absolute URLs found. Duplicates collapse
// because the set is keyed by the canonical form.
//
// Example:
//   base_url = "https://example.com/page"
//   html = "<a href='/docs/'>Docs</a><a href='/docs#top'>Docs</a>"
//   result = {"https://example.com/docs"}
pub fn extract_links(base_url: &str, html: &str) -> BTreeSet<String> {
    let mut links = BTreeSet::new();

    let base = match Url::parse(base_url) {
        Ok(url) => url,
        Err(e) => {
            warn!("Cannot resolve links against invalid base URL {}: {}", base_url, e);
            return links;
        }
    };

    let document = Html::parse_document(html);
    let selector = anchor_selector();

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_href(&base, href) {
                links.insert(normalize_url(absolute_url.as_str()));
            }
        }
    }

    links
}

// "a[href]" is a constant selector, so parsing can only fail if the
// selector grammar itself changes
fn anchor_selector() -> Selector {
    Selector::parse("a[href]").expect("a[href] is a valid CSS selector")
}

// Resolves an href to an absolute URL, or None if it isn't a link we follow
fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    if href.starts_with('/') {
        return base.join(href).ok().filter(is_http);
    }

    Url::parse(href).ok().filter(is_http)
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
