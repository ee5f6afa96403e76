// Public modules
pub mod chat;
pub mod claude;
pub mod clustering;
pub mod config;
pub mod digest;
pub mod email;
pub mod feeds;
pub mod models;
pub mod notify;
pub mod reachability;

// Re-export commonly used types
pub use chat::ChatRenderer;
pub use claude::{ClaudeClient, LanguageModel};
pub use clustering::{
    parse_cluster_reply, Cluster, ClusterArticle, ClusterParseError, ClusteredDigest,
    StoryClusterer,
};
pub use config::{Channel, Config, Delivery, Requirements};
pub use digest::build_digest;
pub use email::{EmailDocument, EmailRenderer};
pub use feeds::{default_sources, load_sources, FeedReader, HeadlineSource};
pub use models::{Article, Digest, Source};
pub use notify::{EmailNotifier, SlackNotifier};
pub use reachability::{enforce_failure_budget, CheckOutcome, CheckResult, ReachabilityChecker};
