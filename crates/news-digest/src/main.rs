use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use shared::feeds::{DEFAULT_LOOKBACK_HOURS, DEFAULT_MAX_ARTICLES};
use shared::{
    build_digest, default_sources, load_sources, Channel, ChatRenderer, ClaudeClient,
    ClusteredDigest, Config, Delivery, EmailNotifier, EmailRenderer, FeedReader, Requirements,
    SlackNotifier, StoryClusterer,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "news-digest")]
#[command(about = "Fetch today's headlines, group shared stories, and deliver a digest")]
struct Args {
    /// Delivery channel (slack, email)
    #[arg(short, long, default_value = "slack")]
    channel: Channel,

    /// Skip story clustering and list headlines per source only
    #[arg(long)]
    no_cluster: bool,

    /// Maximum articles taken from each feed
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_ARTICLES)]
    max_articles: usize,

    /// Only include articles published within this many hours
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_HOURS)]
    hours: i64,

    /// JSON file with the feed list ([{"name": ..., "url": ...}])
    #[arg(short, long)]
    feeds: Option<PathBuf>,

    /// Language for story summaries
    #[arg(short, long, default_value = "English")]
    language: String,

    /// Print the rendered digest instead of sending it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if args.hours <= 0 {
        anyhow::bail!("--hours must be positive, got {}", args.hours);
    }

    let config = Config::from_env(Requirements {
        channel: args.channel,
        clustering: !args.no_cluster,
        dry_run: args.dry_run,
    })?;

    let sources = match &args.feeds {
        Some(path) => load_sources(path)?,
        None => default_sources(),
    };

    let date_label = Local::now().format("%B %d, %Y").to_string();

    let reader = FeedReader::new(args.max_articles, args.hours)?;
    let digest = build_digest(&reader, &sources).await;

    let clustered: Option<ClusteredDigest> = match &config.anthropic_api_key {
        Some(api_key) if !args.no_cluster => {
            info!("Clustering with Claude...");
            let model = ClaudeClient::new(api_key.clone(), config.anthropic_model.clone())?;
            let clusterer = StoryClusterer::new(model, args.language.as_str());
            Some(
                clusterer
                    .cluster(&digest)
                    .await
                    .context("Failed to cluster stories")?,
            )
        }
        _ => None,
    };
    let cluster_count = clustered.as_ref().map_or(0, |c| c.clusters.len());

    match (&config.delivery, args.channel) {
        (Delivery::Slack { webhook_url }, _) => {
            let messages = ChatRenderer::render(&digest, clustered.as_ref(), &date_label);
            let notifier = SlackNotifier::new(webhook_url.clone())?;
            notifier
                .post_all(&messages)
                .await
                .context("Failed to deliver Slack digest")?;
            info!(
                "Slack digest sent — {} clusters, {} total articles",
                cluster_count,
                digest.total_articles()
            );
        }
        (Delivery::Email { api_key, to, from }, _) => {
            let document = EmailRenderer::render(&digest, clustered.as_ref(), &date_label);
            let notifier = EmailNotifier::new(api_key.clone(), from.clone(), to.clone())?;
            let status = notifier
                .send(&document)
                .await
                .context("Failed to deliver email digest")?;
            info!(
                "Email digest sent to {} (status {}) — {} clusters, {} total articles",
                to,
                status,
                cluster_count,
                digest.total_articles()
            );
        }
        (Delivery::Stdout, Channel::Slack) => {
            for message in ChatRenderer::render(&digest, clustered.as_ref(), &date_label) {
                println!("{}\n", message);
            }
        }
        (Delivery::Stdout, Channel::Email) => {
            let document = EmailRenderer::render(&digest, clustered.as_ref(), &date_label);
            println!("Subject: {}\n", document.subject);
            println!("{}", document.html);
            println!("\n----- text -----\n{}", document.text);
        }
    }

    Ok(())
}
