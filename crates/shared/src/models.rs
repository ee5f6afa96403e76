use serde::{Deserialize, Serialize};

/// Title used when a feed entry has none.
pub const TITLE_PLACEHOLDER: &str = "(No title)";

/// Link used when a feed entry has no usable URL.
pub const LINK_PLACEHOLDER: &str = "#";

/// A single headline pulled from a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
}

impl Article {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// A named feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSection {
    pub source: String,
    pub articles: Vec<Article>,
}

/// Articles grouped by source, in the order the sources were inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Digest {
    sections: Vec<SourceSection>,
}

impl Digest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `articles` under `source`. Replacing an existing source keeps
    /// its original position.
    pub fn insert(&mut self, source: impl Into<String>, articles: Vec<Article>) {
        let source = source.into();
        match self.sections.iter_mut().find(|s| s.source == source) {
            Some(section) => section.articles = articles,
            None => self.sections.push(SourceSection { source, articles }),
        }
    }

    pub(crate) fn push_article(&mut self, source: &str, article: Article) {
        match self.sections.iter_mut().find(|s| s.source == source) {
            Some(section) => section.articles.push(article),
            None => self.sections.push(SourceSection {
                source: source.to_string(),
                articles: vec![article],
            }),
        }
    }

    pub fn get(&self, source: &str) -> Option<&[Article]> {
        self.sections
            .iter()
            .find(|s| s.source == source)
            .map(|s| s.articles.as_slice())
    }

    pub fn sections(&self) -> &[SourceSection] {
        &self.sections
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Article])> {
        self.sections
            .iter()
            .map(|s| (s.source.as_str(), s.articles.as_slice()))
    }

    /// Number of sources, including those without articles
    pub fn source_count(&self) -> usize {
        self.sections.len()
    }

    pub fn total_articles(&self) -> usize {
        self.sections.iter().map(|s| s.articles.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
