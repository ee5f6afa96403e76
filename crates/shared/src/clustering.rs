use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

use crate::claude::LanguageModel;
use crate::models::{Article, Digest};

/// Upper bound on clusters kept from a model reply
pub const MAX_CLUSTERS: usize = 5;

/// Why a model reply could not be turned into clusters
#[derive(Debug, Error)]
pub enum ClusterParseError {
    #[error("model reply is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("model reply does not match the cluster schema: {0}")]
    UnexpectedShape(#[source] serde_json::Error),
}

impl From<serde_json::Error> for ClusterParseError {
    fn from(e: serde_json::Error) -> Self {
        match e.classify() {
            serde_json::error::Category::Data => ClusterParseError::UnexpectedShape(e),
            _ => ClusterParseError::InvalidJson(e),
        }
    }
}

/// One cluster exactly as the model described it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawCluster {
    pub topic: String,
    #[serde(default)]
    pub summary: String,
    /// Raw JSON numbers. Values that are not a valid position are skipped
    /// when the cluster is resolved.
    #[serde(default)]
    pub indices: Vec<serde_json::Number>,
}

#[derive(Deserialize)]
struct ClusterReply {
    #[serde(default)]
    clusters: Vec<RawCluster>,
}

/// A member of a cluster, labelled with the source it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterArticle {
    pub source: String,
    pub article: Article,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    pub topic: String,
    pub summary: String,
    /// Distinct member sources, in order of first appearance
    pub sources: Vec<String>,
    pub articles: Vec<ClusterArticle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusteredDigest {
    pub clusters: Vec<Cluster>,
    /// Articles no cluster claimed, still grouped by source
    pub remaining: Digest,
}

/// An article with its position in the flattened digest
#[derive(Debug, Clone, Copy)]
pub struct IndexedArticle<'a> {
    pub index: usize,
    pub source: &'a str,
    pub article: &'a Article,
}

/// Lays the digest out as one list, numbered in source order then feed order.
pub fn flatten(digest: &Digest) -> Vec<IndexedArticle<'_>> {
    digest
        .iter()
        .flat_map(|(source, articles)| articles.iter().map(move |article| (source, article)))
        .enumerate()
        .map(|(index, (source, article))| IndexedArticle {
            index,
            source,
            article,
        })
        .collect()
}

pub fn build_prompt(articles: &[IndexedArticle<'_>], language: &str) -> String {
    let article_list = articles
        .iter()
        .map(|a| format!("[{}] {}: {}", a.index, a.source, a.article.title))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Here are {count} news articles from various sources published today:

{article_list}

Identify the top {max} news stories covered by MULTIPLE sources (same event or topic in 2+ sources).
For each cluster:
- Write a 2-3 sentence neutral summary in {language}
- List the article indices that belong to this cluster

Return ONLY valid JSON, no extra text:
{{
  "clusters": [
    {{
      "topic": "Short topic title ({language})",
      "summary": "2-3 sentence summary.",
      "indices": [0, 3, 7]
    }}
  ]
}}

Order by number of sources covering the story (most first). Only include stories with 2+ sources."#,
        count = articles.len(),
        article_list = article_list,
        max = MAX_CLUSTERS,
        language = language,
    )
}

/// Removes a surrounding markdown code fence, with or without a language tag.
fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    match text.strip_prefix("```") {
        Some(rest) => {
            let inner = rest.split("```").next().unwrap_or("");
            inner.trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        }
        None => text,
    }
}

/// Turns the model's reply text into at most `MAX_CLUSTERS` raw clusters.
pub fn parse_cluster_reply(raw: &str) -> Result<Vec<RawCluster>, ClusterParseError> {
    let body = strip_code_fence(raw);
    let reply: ClusterReply = serde_json::from_str(body)?;
    let mut clusters = reply.clusters;
    clusters.truncate(MAX_CLUSTERS);
    Ok(clusters)
}

/// Resolves raw clusters against the flattened digest and collects whatever
/// they did not claim.
///
/// Out-of-range indices are skipped. An index already claimed (by an earlier
/// cluster or earlier in the same one) is skipped too, so every article ends
/// up either in exactly one cluster or in `remaining`. Clusters left with no
/// members are dropped.
pub fn assemble(
    digest: &Digest,
    articles: &[IndexedArticle<'_>],
    raw_clusters: Vec<RawCluster>,
) -> ClusteredDigest {
    let mut claimed: HashSet<usize> = HashSet::new();
    let mut clusters = Vec::new();

    for raw in raw_clusters {
        let mut sources: Vec<String> = Vec::new();
        let mut members = Vec::new();

        for index in raw.indices {
            let Some(index) = index.as_u64().and_then(|i| usize::try_from(i).ok()) else {
                continue;
            };
            let Some(member) = articles.get(index) else {
                continue;
            };
            if !claimed.insert(index) {
                continue;
            }
            if !sources.iter().any(|s| s == member.source) {
                sources.push(member.source.to_string());
            }
            members.push(ClusterArticle {
                source: member.source.to_string(),
                article: member.article.clone(),
            });
        }

        if members.is_empty() {
            debug!("Dropping cluster '{}' with no valid articles", raw.topic);
            continue;
        }

        clusters.push(Cluster {
            topic: raw.topic,
            summary: raw.summary,
            sources,
            articles: members,
        });
    }

    let mut remaining = Digest::new();
    for (source, _) in digest.iter() {
        remaining.insert(source, Vec::new());
    }
    for a in articles.iter().filter(|a| !claimed.contains(&a.index)) {
        remaining.push_article(a.source, a.article.clone());
    }

    ClusteredDigest {
        clusters,
        remaining,
    }
}

/// Groups cross-source coverage of the same story with a language model
pub struct StoryClusterer<M> {
    model: M,
    language: String,
}

impl<M: LanguageModel> StoryClusterer<M> {
    pub fn new(model: M, language: impl Into<String>) -> Self {
        Self {
            model,
            language: language.into(),
        }
    }

    pub async fn cluster(&self, digest: &Digest) -> Result<ClusteredDigest> {
        let articles = flatten(digest);
        if articles.is_empty() {
            return Ok(ClusteredDigest::default());
        }

        let prompt = build_prompt(&articles, &self.language);
        let reply = self
            .model
            .complete(&prompt)
            .await
            .context("Failed to get clusters from language model")?;

        let raw_clusters =
            parse_cluster_reply(&reply).context("Failed to parse clustering JSON response")?;

        let clustered = assemble(digest, &articles, raw_clusters);
        info!(
            "Found {} clusters covering {} of {} articles",
            clustered.clusters.len(),
            articles.len() - clustered.remaining.total_articles(),
            articles.len()
        );

        Ok(clustered)
    }
}
