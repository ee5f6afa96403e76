use crate::clustering::{Cluster, ClusteredDigest};
use crate::models::{Article, Digest, LINK_PLACEHOLDER};

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━";

/// Renders a digest as a sequence of Slack messages, one per block.
pub struct ChatRenderer;

impl ChatRenderer {
    /// Header, then one message per cluster, then one per source that still
    /// has articles. Without clustering every non-empty source is listed.
    pub fn render(
        digest: &Digest,
        clustered: Option<&ClusteredDigest>,
        date_label: &str,
    ) -> Vec<String> {
        let mut messages = Vec::new();

        messages.push(format!(
            "*📰 Daily News Digest — {}*  |  {} articles · {} sources",
            Self::escape(date_label),
            digest.total_articles(),
            digest.source_count()
        ));

        let remaining = match clustered {
            Some(clustered) => {
                if !clustered.clusters.is_empty() {
                    messages.push(format!("{}\n*📌 Top Stories*", DIVIDER));
                    for (index, cluster) in clustered.clusters.iter().enumerate() {
                        messages.push(Self::render_cluster(index + 1, cluster));
                    }
                }
                &clustered.remaining
            }
            None => digest,
        };

        let sections: Vec<String> = remaining
            .iter()
            .filter(|(_, articles)| !articles.is_empty())
            .map(|(source, articles)| Self::render_source(source, articles))
            .collect();

        if !sections.is_empty() {
            messages.push(format!("{}\n*📂 By Source*", DIVIDER));
            messages.extend(sections);
        }

        messages
    }

    fn render_cluster(number: usize, cluster: &Cluster) -> String {
        let mut lines = vec![format!("*{}. {}*", number, Self::escape(&cluster.topic))];

        if !cluster.summary.trim().is_empty() {
            lines.push(Self::escape(cluster.summary.trim()));
        }

        let links = cluster
            .articles
            .iter()
            .map(|member| Self::link(&member.article.link, &member.source))
            .collect::<Vec<_>>()
            .join("  ");
        if !links.is_empty() {
            lines.push(format!("↗ {}", links));
        }

        lines.join("\n")
    }

    fn render_source(source: &str, articles: &[Article]) -> String {
        let mut lines = vec![format!("*{}*", Self::escape(source))];
        for article in articles {
            lines.push(format!("• {}", Self::link(&article.link, &article.title)));
        }
        lines.join("\n")
    }

    fn link(url: &str, label: &str) -> String {
        if url == LINK_PLACEHOLDER {
            Self::escape(label)
        } else {
            format!(
                "<{}|{}>",
                Self::href(url),
                Self::escape(label).replace('|', "¦")
            )
        }
    }

    /// Normalised URL with the characters that end Slack link markup
    /// percent-encoded.
    fn href(url: &str) -> String {
        let normalised = url::Url::parse(url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string());
        normalised
            .replace('|', "%7C")
            .replace('<', "%3C")
            .replace('>', "%3E")
    }

    /// Slack treats these three characters as control characters.
    fn escape(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }
}
