use anyhow::Result;
use clap::Parser;
use shared::feeds::{DEFAULT_LOOKBACK_HOURS, DEFAULT_MAX_ARTICLES};
use shared::{default_sources, enforce_failure_budget, load_sources, FeedReader, ReachabilityChecker};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "check-feeds")]
#[command(about = "Check that every configured feed is reachable")]
struct Args {
    /// JSON file with the feed list ([{"name": ..., "url": ...}])
    #[arg(short, long)]
    feeds: Option<PathBuf>,

    /// Fail when more feeds than this are unreachable
    #[arg(long, default_value_t = 3)]
    max_failures: usize,

    /// Number of feeds checked at once
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Also fetch each feed and report how many articles it yields
    #[arg(long)]
    fetch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    let sources = match &args.feeds {
        Some(path) => load_sources(path)?,
        None => default_sources(),
    };

    println!("🔍 Checking {} feeds...\n", sources.len());
    let checker = ReachabilityChecker::new()?;
    let results = checker.check_all(&sources, args.concurrency).await;

    let reader = if args.fetch {
        Some(FeedReader::new(DEFAULT_MAX_ARTICLES, DEFAULT_LOOKBACK_HOURS)?)
    } else {
        None
    };

    for result in &results {
        let mark = if result.outcome.is_failure() { "✗" } else { "✓" };
        let mut line = format!("  {} {}: {}", mark, result.source.name, result.outcome);

        if let Some(reader) = &reader {
            if !result.outcome.is_failure() {
                let articles = reader
                    .fetch_feed(&result.source.name, &result.source.url)
                    .await;
                line.push_str(&format!(", {} recent articles", articles.len()));
            }
        }

        println!("{}", line);
    }

    let failed = results.iter().filter(|r| r.outcome.is_failure()).count();

    println!(
        "\n✓ {}/{} feeds reachable",
        results.len() - failed,
        results.len()
    );

    enforce_failure_budget(&results, args.max_failures)?;

    Ok(())
}
