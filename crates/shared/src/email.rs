use serde::Serialize;

use crate::clustering::ClusteredDigest;
use crate::models::{Article, Digest};

const TEXT_WIDTH: usize = 80;

/// A complete email: subject plus HTML and plain-text bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailDocument {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub struct EmailRenderer;

impl EmailRenderer {
    pub fn subject(date_label: &str) -> String {
        format!("Daily News Digest — {}", date_label)
    }

    pub fn render(
        digest: &Digest,
        clustered: Option<&ClusteredDigest>,
        date_label: &str,
    ) -> EmailDocument {
        let html = Self::render_html(digest, clustered, date_label);
        let text = html2text::from_read(html.as_bytes(), TEXT_WIDTH);

        EmailDocument {
            subject: Self::subject(date_label),
            html,
            text,
        }
    }

    /// Every source gets a section, including those with nothing to show.
    pub fn render_html(
        digest: &Digest,
        clustered: Option<&ClusteredDigest>,
        date_label: &str,
    ) -> String {
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str("  <meta charset=\"UTF-8\">\n");
        html.push_str(&format!(
            "  <title>Daily News Digest - {}</title>\n",
            Self::escape_html(date_label)
        ));
        html.push_str("  <style>\n");
        html.push_str("    body { font-family: Arial, sans-serif; max-width: 700px; margin: 20px auto; padding: 0 16px; line-height: 1.5; color: #222; }\n");
        html.push_str("    h1 { color: #2c3e50; border-bottom: 3px solid #3498db; padding-bottom: 8px; }\n");
        html.push_str("    h2 { color: #34495e; margin-top: 32px; }\n");
        html.push_str("    h3 { color: #2c3e50; margin: 20px 0 6px 0; }\n");
        html.push_str("    .meta { color: #7f8c8d; font-size: 0.9em; }\n");
        html.push_str("    .cluster { margin: 16px 0; padding: 10px 14px; background-color: #f8f9fa; border-left: 4px solid #3498db; }\n");
        html.push_str("    .links a { margin-right: 10px; }\n");
        html.push_str("    a { color: #3498db; text-decoration: none; }\n");
        html.push_str("    ul { margin: 6px 0; padding-left: 20px; }\n");
        html.push_str("    li { margin: 4px 0; }\n");
        html.push_str("    .empty { color: #95a5a6; font-style: italic; }\n");
        html.push_str("  </style>\n");
        html.push_str("</head>\n<body>\n");

        html.push_str("<h1>📰 Daily News Digest</h1>\n");
        html.push_str(&format!(
            "<p class=\"meta\">{} · {} articles · {} sources</p>\n",
            Self::escape_html(date_label),
            digest.total_articles(),
            digest.source_count()
        ));

        if let Some(clustered) = clustered.filter(|c| !c.clusters.is_empty()) {
            html.push_str("<h2>📌 Top Stories</h2>\n");
            for (index, cluster) in clustered.clusters.iter().enumerate() {
                html.push_str("<div class=\"cluster\">\n");
                html.push_str(&format!(
                    "  <h3>{}. {}</h3>\n",
                    index + 1,
                    Self::escape_html(&cluster.topic)
                ));
                if !cluster.summary.trim().is_empty() {
                    html.push_str(&format!(
                        "  <p>{}</p>\n",
                        Self::escape_html(cluster.summary.trim())
                    ));
                }
                html.push_str("  <ul>\n");
                for member in &cluster.articles {
                    html.push_str(&format!(
                        "    <li>{} <span class=\"meta\">({})</span></li>\n",
                        Self::anchor(&member.article),
                        Self::escape_html(&member.source)
                    ));
                }
                html.push_str("  </ul>\n");
                html.push_str("</div>\n");
            }
            html.push_str("<h2>📂 By Source</h2>\n");
        }

        for (source, articles) in digest.iter() {
            html.push_str(&format!("<h3>{}</h3>\n", Self::escape_html(source)));

            let shown = match clustered {
                Some(clustered) => clustered.remaining.get(source).unwrap_or(&[]),
                None => articles,
            };

            if shown.is_empty() {
                let note = if articles.is_empty() {
                    "No articles in this period."
                } else {
                    "All articles from this source are in Top Stories."
                };
                html.push_str(&format!("<p class=\"empty\">{}</p>\n", note));
                continue;
            }

            html.push_str("<ul>\n");
            for article in shown {
                html.push_str(&format!("  <li>{}</li>\n", Self::anchor(article)));
            }
            html.push_str("</ul>\n");
        }

        html.push_str("</body>\n</html>");
        html
    }

    fn anchor(article: &Article) -> String {
        format!(
            "<a href=\"{}\">{}</a>",
            Self::escape_html(&article.link),
            Self::escape_html(&article.title)
        )
    }

    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::{Cluster, ClusterArticle};

    fn digest() -> Digest {
        let mut digest = Digest::new();
        digest.insert(
            "Wired",
            vec![
                Article::new("Robots everywhere", "https://wired.com/1"),
                Article::new("Chips & dips", "https://wired.com/2?a=1&b=2"),
            ],
        );
        digest.insert("Fortune", Vec::new());
        digest.insert(
            "Forbes",
            vec![Article::new("Robots are coming", "https://forbes.com/1")],
        );
        digest
    }

    #[test]
    fn plain_email_lists_every_source() {
        let doc = EmailRenderer::render(&digest(), None, "February 20, 2026");

        assert_eq!(doc.subject, "Daily News Digest — February 20, 2026");
        assert!(doc.html.contains("<h3>Wired</h3>"));
        assert!(doc.html.contains("<h3>Fortune</h3>\n<p class=\"empty\">No articles in this period.</p>"));
        assert!(doc.html.contains("<h3>Forbes</h3>"));
        assert!(doc
            .html
            .contains("<a href=\"https://wired.com/2?a=1&amp;b=2\">Chips &amp; dips</a>"));
        assert!(doc.html.contains("3 articles · 3 sources"));
        assert!(!doc.html.contains("Top Stories"));
    }

    #[test]
    fn sources_appear_in_digest_order() {
        let html = EmailRenderer::render_html(&digest(), None, "today");
        let wired = html.find("<h3>Wired</h3>").unwrap();
        let fortune = html.find("<h3>Fortune</h3>").unwrap();
        let forbes = html.find("<h3>Forbes</h3>").unwrap();
        assert!(wired < fortune && fortune < forbes);
    }

    #[test]
    fn clustered_email_shows_top_stories_and_leftovers() {
        let mut remaining = Digest::new();
        remaining.insert(
            "Wired",
            vec![Article::new("Chips & dips", "https://wired.com/2?a=1&b=2")],
        );
        remaining.insert("Fortune", Vec::new());
        remaining.insert("Forbes", Vec::new());
        let clustered = ClusteredDigest {
            clusters: vec![Cluster {
                topic: "Robots".to_string(),
                summary: "Robots are here.".to_string(),
                sources: vec!["Wired".to_string(), "Forbes".to_string()],
                articles: vec![
                    ClusterArticle {
                        source: "Wired".to_string(),
                        article: Article::new("Robots everywhere", "https://wired.com/1"),
                    },
                    ClusterArticle {
                        source: "Forbes".to_string(),
                        article: Article::new("Robots are coming", "https://forbes.com/1"),
                    },
                ],
            }],
            remaining,
        };

        let html = EmailRenderer::render_html(&digest(), Some(&clustered), "today");

        assert!(html.contains("<h3>1. Robots</h3>"));
        assert!(html.contains("<p>Robots are here.</p>"));
        assert!(html.contains(
            "<li><a href=\"https://forbes.com/1\">Robots are coming</a> <span class=\"meta\">(Forbes)</span></li>"
        ));
        assert!(html.contains(
            "<h3>Forbes</h3>\n<p class=\"empty\">All articles from this source are in Top Stories.</p>"
        ));
        assert!(html.contains("<h3>Fortune</h3>\n<p class=\"empty\">No articles in this period.</p>"));
        assert!(html.find("Top Stories").unwrap() < html.find("By Source").unwrap());
    }

    #[test]
    fn text_part_carries_the_headlines() {
        let doc = EmailRenderer::render(&digest(), None, "today");
        assert!(doc.text.contains("Robots everywhere"));
        assert!(doc.text.contains("Fortune"));
        assert!(doc.text.contains("No articles in this period."));
    }

    #[test]
    fn rendering_is_repeatable() {
        let first = EmailRenderer::render(&digest(), None, "today");
        let second = EmailRenderer::render(&digest(), None, "today");
        assert_eq!(first, second);
    }
}
