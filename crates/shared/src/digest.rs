use tracing::info;

use crate::feeds::HeadlineSource;
use crate::models::{Digest, Source};

/// Reads every source in order, one at a time. A source that yields nothing
/// still gets an (empty) entry.
pub async fn build_digest<H>(reader: &H, sources: &[Source]) -> Digest
where
    H: HeadlineSource + ?Sized,
{
    let mut digest = Digest::new();

    for source in sources {
        info!("Fetching {}...", source.name);
        let articles = reader.fetch(source).await;
        digest.insert(source.name.clone(), articles);
    }

    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Article;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedReader {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HeadlineSource for ScriptedReader {
        async fn fetch(&self, source: &Source) -> Vec<Article> {
            self.calls.lock().unwrap().push(source.name.clone());
            if source.url.contains("broken") {
                return Vec::new();
            }
            vec![Article::new(
                format!("{} headline", source.name),
                format!("{}/1", source.url),
            )]
        }
    }

    #[tokio::test]
    async fn keeps_configured_order_and_empty_sources() {
        let reader = ScriptedReader {
            calls: Mutex::new(Vec::new()),
        };
        let sources = vec![
            Source::new("Wired", "https://wired.example"),
            Source::new("Broken", "https://broken.example"),
            Source::new("Fortune", "https://fortune.example"),
        ];

        let digest = build_digest(&reader, &sources).await;

        let names: Vec<&str> = digest.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Wired", "Broken", "Fortune"]);
        assert_eq!(digest.get("Broken"), Some(&[][..]));
        assert_eq!(digest.total_articles(), 2);
        assert_eq!(
            *reader.calls.lock().unwrap(),
            vec!["Wired".to_string(), "Broken".to_string(), "Fortune".to_string()]
        );
    }

    #[tokio::test]
    async fn no_sources_gives_empty_digest() {
        let reader = ScriptedReader {
            calls: Mutex::new(Vec::new()),
        };
        let digest = build_digest(&reader, &[]).await;
        assert!(digest.is_empty());
    }
}
