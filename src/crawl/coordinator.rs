// src/crawl/coordinator.rs
// =============================================================================
// This module runs the crawl: N identical workers sharing one frontier, one
// result store and one stop signal.
//
// Each worker loops:
// 1. stop if the stop signal is set
// 2. check a URL out of the frontier (or wait, or stop if the frontier is
//    exhausted)
// 3. fetch it; pages that can't be fetched are simply skipped
// 4. extract the page's in-scope links
// 5. record (page URL -> links) in the result store; if the store is full,
//    set the stop signal and stop
// 6. feed the links back into the frontier
//
// The crawl ends when the store is full (stop signal) or when every worker
// sees an empty frontier with no URL still in flight. A worker only finds
// the frontier "exhausted" once nobody is holding a checked-out URL, so a
// worker can't quit while another one is about to enqueue more links.
//
// Rust concepts:
// - Arc: shared ownership of the frontier and store between tasks
// - JoinSet: a group of spawned tasks we can wait on one by one
// - CancellationToken: a cloneable "please stop" flag, set once
// - tokio::select!: wait for whichever of several futures finishes first
// =============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::futures::Notified;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::frontier::{Checkout, Frontier};
use super::normalize::normalize_url;
use super::store::{PageRecord, ResultStore};
use crate::config::CrawlConfig;
use crate::error::CrawlError;
use crate::page::{extract_links, Fetcher};

// Upper bound on how long an idle worker sleeps before looking at the
// frontier again, in case a wake-up is missed
const IDLE_WAIT: Duration = Duration::from_millis(50);

// Everything the crawl produced
#[derive(Debug)]
pub struct CrawlReport {
    /// Crawled pages in the order they were recorded
    pub pages: Vec<PageRecord>,
    /// Number of workers that crashed instead of stopping normally
    pub failed_workers: usize,
    /// Wall time of the whole crawl
    pub elapsed: Duration,
}

// Crawls the site config.start_url lives on.
//
// Parameters:
//   config: start URL, worker count, page limit, ...
//   make_fetcher: builds one fetcher per worker, given the host the crawl is
//                 scoped to (e.g. "example.com")
//
// Returns: the crawl report once every worker has stopped. Fails up front if
// the start URL is invalid or a fetcher can't be built; worker crashes are
// counted in the report instead.
pub async fn crawl<F, M>(config: &CrawlConfig, make_fetcher: M) -> Result<CrawlReport, CrawlError>
where
    F: Fetcher + 'static,
    M: Fn(&str) -> Result<F, CrawlError>,
{
    let started = Instant::now();

    let frontier = Arc::new(Frontier::for_seed(&config.start_url)?);
    let store = Arc::new(ResultStore::new(config.max_pages));
    let stop = CancellationToken::new();

    let worker_count = config.worker_count();
    info!(
        "Starting the crawler on {} with {} workers (max {} pages)",
        frontier.allowed_host(),
        worker_count,
        config.max_pages
    );

    // Build every fetcher first, so a bad client config fails before any
    // task is running
    let fetchers = (0..worker_count)
        .map(|_| make_fetcher(frontier.allowed_host()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut workers = JoinSet::new();
    for (id, fetcher) in fetchers.into_iter().enumerate() {
        let worker = Worker {
            id,
            frontier: Arc::clone(&frontier),
            store: Arc::clone(&store),
            stop: stop.clone(),
            fetcher,
        };
        workers.spawn(worker.run());
    }

    // Wait for every worker, even after a crash, so each one has dropped its
    // fetcher before we return
    let mut failed_workers = 0;
    while let Some(result) = workers.join_next().await {
        if let Err(e) = result {
            error!("Crawl worker failed: {}. Stopping the remaining workers.", e);
            failed_workers += 1;
            stop.cancel();
        }
    }

    let report = CrawlReport {
        pages: store.snapshot(),
        failed_workers,
        elapsed: started.elapsed(),
    };

    info!(
        "Crawled {} pages in {:.2} seconds ({} URLs discovered, {} never fetched)",
        report.pages.len(),
        report.elapsed.as_secs_f64(),
        frontier.visited_count(),
        frontier.pending_count()
    );

    Ok(report)
}

// What happened to one checked-out URL
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Recorded,
    Skipped,
    Stopped,
}

struct Worker<F> {
    id: usize,
    frontier: Arc<Frontier>,
    store: Arc<ResultStore>,
    stop: CancellationToken,
    fetcher: F,
}

impl<F: Fetcher> Worker<F> {
    // Returns the number of pages this worker recorded
    async fn run(self) -> usize {
        debug!("Starting the crawler worker with id={}", self.id);
        let mut recorded = 0;

        loop {
            if self.stop.is_cancelled() {
                debug!("Stop signal set. Stopping the crawler worker with id={}", self.id);
                break;
            }

            let changed = self.frontier.changed();
            let work = match self.frontier.checkout() {
                Checkout::Claimed(work) => work,
                Checkout::Idle => {
                    self.wait_for_work(changed).await;
                    continue;
                }
                Checkout::Exhausted => {
                    debug!("Frontier exhausted. Stopping the crawler worker with id={}", self.id);
                    break;
                }
            };

            // `work` stays checked out until the end of this iteration, after
            // the page's links have been added to the frontier
            match self.process(work.url()).await {
                Outcome::Recorded => recorded += 1,
                Outcome::Skipped => {}
                Outcome::Stopped => break,
            }
        }

        info!(
            "Stopping the crawler worker with id={} ({} pages recorded)",
            self.id, recorded
        );
        recorded
    }

    async fn wait_for_work(&self, changed: Notified<'_>) {
        tokio::select! {
            _ = changed => {}
            _ = self.stop.cancelled() => {}
            _ = tokio::time::sleep(IDLE_WAIT) => {}
        }
    }

    async fn process(&self, url: &str) -> Outcome {
        debug!("[worker {}] Fetching {}", self.id, url);
        let page = match self.fetcher.fetch(url).await {
            Some(page) => page,
            None => {
                debug!("[worker {}] No content from {}", self.id, url);
                return Outcome::Skipped;
            }
        };

        // The stop signal may have been set while we were waiting on the
        // network
        if self.stop.is_cancelled() {
            return Outcome::Stopped;
        }

        // A redirect lands on a URL the frontier may already know about;
        // whoever claims it first in `visited` is the only one to record it
        let page_url = normalize_url(&page.final_url);
        if page_url != url && !self.frontier.mark_visited(&page_url) {
            debug!(
                "[worker {}] {} redirected to already seen {}",
                self.id, url, page_url
            );
            return Outcome::Skipped;
        }

        let links: BTreeSet<String> = extract_links(&page.final_url, &page.body)
            .into_iter()
            .filter(|link| self.frontier.is_in_scope(link))
            .collect();

        if !self.store.record(page_url.clone(), links.clone()) {
            debug!(
                "[worker {}] Max number of pages reached, {} not recorded",
                self.id, page_url
            );
            self.stop.cancel();
            return Outcome::Stopped;
        }
        debug!("[worker {}] Recorded {} ({} links)", self.id, page_url, links.len());

        if self.store.is_full() {
            self.stop.cancel();
        }

        for link in &links {
            self.frontier.add_url(link);
        }

        Outcome::Recorded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::FetchedPage;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    const SEED: &str = "https://example.com";

    // An in-memory site: canonical URL -> HTML body. Unknown URLs behave
    // like failed fetches. Every fetch is logged.
    #[derive(Clone, Default)]
    struct FakeSite {
        pages: Arc<HashMap<String, String>>,
        fetched: Arc<Mutex<Vec<String>>>,
    }

    impl FakeSite {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: Arc::new(
                    pages
                        .iter()
                        .map(|(url, body)| (url.to_string(), body.to_string()))
                        .collect(),
                ),
                fetched: Arc::default(),
            }
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for FakeSite {
        async fn fetch(&self, url: &str) -> Option<FetchedPage> {
            self.fetched.lock().unwrap().push(url.to_string());
            tokio::task::yield_now().await;
            self.pages.get(url).map(|body| FetchedPage {
                final_url: url.to_string(),
                body: body.clone(),
            })
        }
    }

    // A site where every page links to three new child pages
    #[derive(Clone, Default)]
    struct EndlessSite {
        fetched: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Fetcher for EndlessSite {
        async fn fetch(&self, url: &str) -> Option<FetchedPage> {
            self.fetched.lock().unwrap().push(url.to_string());
            tokio::time::sleep(Duration::from_millis(1)).await;
            let body = (0..3)
                .map(|i| format!(r#"<a href="{}/{}">child</a>"#, url, i))
                .collect::<String>();
            Some(FetchedPage {
                final_url: url.to_string(),
                body,
            })
        }
    }

    // Panics when asked for one specific URL
    #[derive(Clone)]
    struct CrashingSite {
        site: FakeSite,
        crash_on: &'static str,
    }

    #[async_trait]
    impl Fetcher for CrashingSite {
        async fn fetch(&self, url: &str) -> Option<FetchedPage> {
            if url == self.crash_on {
                panic!("fetcher bug triggered by {}", url);
            }
            self.site.fetch(url).await
        }
    }

    // Serves `from` with the content of `to`, as if `from` answered with a
    // redirect to `to`
    #[derive(Clone)]
    struct RedirectingSite {
        site: FakeSite,
        from: &'static str,
        to: &'static str,
    }

    #[async_trait]
    impl Fetcher for RedirectingSite {
        async fn fetch(&self, url: &str) -> Option<FetchedPage> {
            if url != self.from {
                return self.site.fetch(url).await;
            }
            self.site.fetched.lock().unwrap().push(url.to_string());
            self.site.pages.get(self.to).map(|body| FetchedPage {
                final_url: self.to.to_string(),
                body: body.clone(),
            })
        }
    }

    fn config(workers: usize, max_pages: usize) -> CrawlConfig {
        CrawlConfig::new(SEED)
            .with_workers(workers)
            .with_max_pages(max_pages)
    }

    async fn run<F: Fetcher + Clone + 'static>(config: CrawlConfig, fetcher: F) -> CrawlReport {
        let crawling = crawl(&config, |_| Ok(fetcher.clone()));
        tokio::time::timeout(Duration::from_secs(10), crawling)
            .await
            .expect("crawl should not hang")
            .expect("crawl should succeed")
    }

    fn record(url: &str, links: &[&str]) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            links: links.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_single_page_cap_filters_external_links() {
        let site = FakeSite::new(&[(
            SEED,
            r#"<a href="https://example.com/a">A</a><a href="https://external.com/b">B</a>"#,
        )]);

        let report = run(config(3, 1), site.clone()).await;

        assert_eq!(report.pages, vec![record(SEED, &["https://example.com/a"])]);
        assert_eq!(report.failed_workers, 0);
        // /a was queued but never fetched: the cap was already reached
        assert_eq!(site.fetched(), vec![SEED.to_string()]);
    }

    #[tokio::test]
    async fn test_self_link_is_crawled_once() {
        let site = FakeSite::new(&[(SEED, r#"<a href="/">Home</a>"#)]);

        let report = run(config(4, 10), site.clone()).await;

        assert_eq!(report.pages, vec![record(SEED, &[SEED])]);
        assert_eq!(site.fetched(), vec![SEED.to_string()]);
    }

    #[tokio::test]
    async fn test_page_without_links_terminates() {
        let site = FakeSite::new(&[(SEED, "<p>Nothing to see here</p>")]);

        let report = run(config(5, 10), site).await;

        assert_eq!(report.pages, vec![record(SEED, &[])]);
    }

    #[tokio::test]
    async fn test_unreachable_seed_records_nothing() {
        let report = run(config(2, 10), FakeSite::default()).await;
        assert!(report.pages.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_whole_site_is_crawled_once_per_page() {
        let site = FakeSite::new(&[
            (SEED, r#"<a href="/a">A</a><a href="/b">B</a>"#),
            ("https://example.com/a", r#"<a href="/c">C</a><a href="/">Home</a>"#),
            ("https://example.com/b", r#"<a href="/c/">C</a><a href="/d#x">D</a>"#),
            ("https://example.com/c", r#"<a href="/a">A</a>"#),
            ("https://example.com/d", r#"<a href="/missing">Missing</a>"#),
        ]);

        let report = run(config(3, 10), site.clone()).await;

        let crawled: HashSet<_> = report.pages.iter().map(|p| p.url.as_str()).collect();
        let expected: HashSet<_> = [
            SEED,
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/c",
            "https://example.com/d",
        ]
        .into_iter()
        .collect();
        assert_eq!(crawled, expected);

        // Every discovered URL was fetched exactly once, including the
        // missing page
        let fetched = site.fetched();
        let unique: HashSet<_> = fetched.iter().collect();
        assert_eq!(fetched.len(), 6);
        assert_eq!(unique.len(), 6);

        // The seed is always recorded first
        assert_eq!(report.pages[0].url, SEED);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_page_cap_on_endless_site() {
        for max_pages in [1, 7, 20] {
            let site = EndlessSite::default();
            let report = run(config(4, max_pages), site.clone()).await;

            assert_eq!(report.pages.len(), max_pages, "max_pages = {}", max_pages);

            let fetched = site.fetched.lock().unwrap().clone();
            let unique: HashSet<_> = fetched.iter().collect();
            assert_eq!(unique.len(), fetched.len(), "a URL was fetched twice");
        }
    }

    #[tokio::test]
    async fn test_worker_crash_is_reported() {
        let site = CrashingSite {
            site: FakeSite::new(&[
                (SEED, r#"<a href="/boom">Boom</a><a href="/ok">OK</a>"#),
                ("https://example.com/ok", "<p>fine</p>"),
            ]),
            crash_on: "https://example.com/boom",
        };

        let report = run(config(2, 10), site).await;

        assert_eq!(report.failed_workers, 1);
        assert_eq!(report.pages[0].url, SEED);
    }

    #[tokio::test]
    async fn test_invalid_seed_fails() {
        let config = CrawlConfig::new("definitely not a url");
        let result = crawl(&config, |_| Ok(FakeSite::default())).await;
        assert!(matches!(result, Err(CrawlError::InvalidSeed { .. })));
    }

    #[tokio::test]
    async fn test_fetcher_factory_error_fails() {
        let result = crawl(&config(2, 10), |_| -> Result<FakeSite, CrawlError> {
            Err(CrawlError::WorkersFailed(0))
        })
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetchers_are_scoped_to_seed_host() {
        let hosts = Mutex::new(Vec::new());
        let config = CrawlConfig::new("https://Example.com:443/start/").with_workers(3);

        crawl(&config, |host| {
            hosts.lock().unwrap().push(host.to_string());
            Ok(FakeSite::default())
        })
        .await
        .unwrap();

        assert_eq!(*hosts.lock().unwrap(), vec!["example.com"; 3]);
    }

    #[tokio::test]
    async fn test_redirect_to_known_page_is_not_fetched_twice() {
        let site = RedirectingSite {
            site: FakeSite::new(&[
                (SEED, r#"<a href="/old">Old</a><a href="/new">New</a>"#),
                ("https://example.com/new", "<p>new home</p>"),
            ]),
            from: "https://example.com/old",
            to: "https://example.com/new",
        };

        let report = run(config(1, 10), site.clone()).await;

        assert_eq!(
            report.pages,
            vec![
                record(SEED, &["https://example.com/new", "https://example.com/old"]),
                record("https://example.com/new", &[]),
            ]
        );
        let fetched = site.site.fetched();
        assert_eq!(
            fetched.iter().filter(|u| *u == "https://example.com/new").count(),
            1,
            "fetched: {:?}",
            fetched
        );
    }

    #[tokio::test]
    async fn test_redirect_to_unknown_page_is_recorded_under_final_url() {
        let site = RedirectingSite {
            site: FakeSite::new(&[
                (SEED, r#"<a href="/old">Old</a>"#),
                ("https://example.com/new", r#"<a href="/">Home</a>"#),
            ]),
            from: "https://example.com/old",
            to: "https://example.com/new",
        };

        let report = run(config(2, 10), site.clone()).await;

        assert_eq!(
            report.pages,
            vec![
                record(SEED, &["https://example.com/old"]),
                record("https://example.com/new", &[SEED]),
            ]
        );
        // The final URL is now visited, so it is never queued on its own
        assert_eq!(site.site.fetched().len(), 2);
    }
}
