// src/main.rs
// =============================================================================
// This is the entry point of the crawler.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, to stderr, so stdout only carries results)
// 3. Run the crawl
// 4. Print the crawled pages and their links
// 5. Exit with proper code (0 = crawl finished, 2 = error)
// =============================================================================

mod cli;
mod config;
mod crawl;
mod error;
mod page;
mod report;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use error::CrawlError;
use page::HttpFetcher;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG wins when set; otherwise "info", or "debug" with --verbose
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.crawl_config();

    let report = crawl::crawl(&config, |host| HttpFetcher::new(host, &config)).await?;

    let stdout = std::io::stdout();
    report::write_report(&mut stdout.lock(), &report.pages, cli.json)?;

    // Pages from before the crash are still printed, but the run failed
    if report.failed_workers > 0 {
        return Err(CrawlError::WorkersFailed(report.failed_workers).into());
    }

    Ok(())
}
