use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::models::{Article, Source, LINK_PLACEHOLDER, TITLE_PLACEHOLDER};

pub const DEFAULT_MAX_ARTICLES: usize = 10;
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;

const USER_AGENT: &str = "Mozilla/5.0";

/// The sources the daily digest reads when no feed file is given.
pub fn default_sources() -> Vec<Source> {
    [
        ("The Verge", "https://www.theverge.com/rss/index.xml"),
        ("TechCrunch", "https://techcrunch.com/feed/"),
        ("Wired", "https://www.wired.com/feed/rss"),
        ("404 Media", "https://www.404media.co/rss/"),
        ("Bloomberg", "https://feeds.bloomberg.com/technology/news.rss"),
        ("Business Insider", "https://feeds.businessinsider.com/custom/all"),
        ("Fortune", "https://fortune.com/feed/"),
        ("Forbes", "https://www.forbes.com/innovation/feed2/"),
        (
            "New York Times",
            "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml",
        ),
        ("WSJ", "https://feeds.a.dj.com/rss/WSJcomUSBusiness.xml"),
        ("TradedVC", "https://www.tradedvc.com/rss.xml"),
        (
            "Google Trends",
            "https://trends.google.com/trends/trendingsearches/daily/rss?geo=US",
        ),
    ]
    .into_iter()
    .map(|(name, url)| Source::new(name, url))
    .collect()
}

/// Loads a feed list from a JSON array of `{"name": ..., "url": ...}` objects.
pub fn load_sources(path: &Path) -> Result<Vec<Source>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read feed list: {}", path.display()))?;
    parse_sources(&content).with_context(|| format!("Invalid feed list: {}", path.display()))
}

pub fn parse_sources(content: &str) -> Result<Vec<Source>> {
    let sources: Vec<Source> =
        serde_json::from_str(content).context("Feed list must be a JSON array of {name, url}")?;

    if sources.is_empty() {
        anyhow::bail!("Feed list is empty");
    }

    let mut seen = HashSet::new();
    for source in &sources {
        if source.name.trim().is_empty() {
            anyhow::bail!("Feed with URL {} has an empty name", source.url);
        }
        if !seen.insert(source.name.as_str()) {
            anyhow::bail!("Duplicate feed name: {}", source.name);
        }
        url::Url::parse(&source.url)
            .with_context(|| format!("Feed '{}' has an invalid URL", source.name))?;
    }

    Ok(sources)
}

/// Anything that can turn a source into a list of headlines. Implementations
/// absorb their own failures and return an empty list instead.
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn fetch(&self, source: &Source) -> Vec<Article>;
}

pub struct FeedReader {
    client: Client,
    max_articles: usize,
    lookback: Duration,
}

impl FeedReader {
    pub fn new(max_articles: usize, lookback_hours: i64) -> Result<Self> {
        let lookback = Duration::try_hours(lookback_hours)
            .with_context(|| format!("Lookback of {} hours is out of range", lookback_hours))?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_articles,
            lookback,
        })
    }

    /// Fetches one feed. Network and parse failures are logged and yield an
    /// empty list.
    pub async fn fetch_feed(&self, name: &str, url: &str) -> Vec<Article> {
        match self.try_fetch_feed(url).await {
            Ok(articles) => {
                debug!("{}: {} articles", name, articles.len());
                articles
            }
            Err(e) => {
                warn!("{}: {:#}", name, e);
                Vec::new()
            }
        }
    }

    async fn try_fetch_feed(&self, url: &str) -> Result<Vec<Article>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send HTTP request")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP error: {}", status);
        }

        let body = response
            .bytes()
            .await
            .context("Failed to read response body")?;

        select_articles(&body, Utc::now(), self.max_articles, self.lookback)
    }
}

#[async_trait]
impl HeadlineSource for FeedReader {
    async fn fetch(&self, source: &Source) -> Vec<Article> {
        self.fetch_feed(&source.name, &source.url).await
    }
}

/// Parses a feed document and picks its headlines: the first `max_articles`
/// entries in feed order, then only those published after `now - lookback`.
/// Entries without a timestamp are kept. A lookback reaching past the earliest
/// representable time keeps everything.
pub fn select_articles(
    body: &[u8],
    now: DateTime<Utc>,
    max_articles: usize,
    lookback: Duration,
) -> Result<Vec<Article>> {
    let feed = feed_rs::parser::parse(body).context("Failed to parse feed")?;
    let cutoff = now.checked_sub_signed(lookback);

    let articles = feed
        .entries
        .into_iter()
        .take(max_articles)
        .filter(|entry| match entry.published.or(entry.updated) {
            Some(published) => cutoff.map_or(true, |cutoff| published >= cutoff),
            None => true,
        })
        .map(|entry| {
            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| TITLE_PLACEHOLDER.to_string());
            let link = entry
                .links
                .iter()
                .map(|l| l.href.trim())
                .find(|href| is_web_url(href))
                .map(str::to_string)
                .unwrap_or_else(|| LINK_PLACEHOLDER.to_string());
            Article { title, link }
        })
        .collect();

    Ok(articles)
}

fn is_web_url(href: &str) -> bool {
    url::Url::parse(href)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}
