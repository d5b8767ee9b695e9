// src/crawl/normalize.rs
// =============================================================================
// URL canonicalization.
//
// The frontier and the result store compare URLs as plain strings, so two
// spellings of the same page must turn into the same string before they are
// stored. The rules (applied in order):
//
// 1. lowercase the scheme          HTTPS://...          -> https://...
// 2. lowercase the host            https://Example.COM  -> https://example.com
// 3. drop the default port         https://example.com:443 -> https://example.com
// 4. drop the fragment             /about#team          -> /about
// 5. drop an empty query           /about?              -> /about
// 6. drop trailing slashes         /about/              -> /about
//                                  https://example.com/ -> https://example.com
//
// Steps 1 and 3 are done for us by the `url` crate's parser.
// =============================================================================

use tracing::debug;
use url::{Position, Url};

// Returns the canonical form of a URL.
//
// Never fails: input the `url` crate can't parse is passed through with only
// the fragment and trailing slashes removed. Such URLs have no host, so the
// frontier's domain filter rejects them later.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();

    let mut url = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return normalize_best_effort(raw),
    };

    // Special schemes (http, https) already have lowercase hosts, but opaque
    // hosts of other schemes keep whatever case they were written in
    if let Some(host) = url.host_str() {
        let lower = host.to_ascii_lowercase();
        if lower != host && url.set_host(Some(&lower)).is_err() {
            debug!("Keeping host of {} as written: cannot lowercase it", raw);
        }
    }

    url.set_fragment(None);
    if url.query() == Some("") {
        url.set_query(None);
    }

    // The url crate always serializes "/" for an empty http path, so the
    // trimmed path has to be spliced back between the authority and the query
    let path = url.path().trim_end_matches('/');
    format!(
        "{}{}{}",
        &url[..Position::BeforePath],
        path,
        &url[Position::AfterPath..]
    )
}

fn normalize_best_effort(raw: &str) -> String {
    let without_fragment = raw.split('#').next().unwrap_or_default();
    without_fragment.trim_end_matches('/').to_string()
}

// Returns the network location ("host" or "host:port") used to decide
// whether a URL belongs to the crawl.
//
// The port is only included when it isn't the scheme's default, so
// http://example.com:80 and http://example.com share a host key.
pub fn host_key(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();

    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}
