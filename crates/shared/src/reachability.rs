use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use std::fmt;
use tracing::debug;

use crate::models::Source;

pub const CHECK_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Reachable(StatusCode),
    HttpError(StatusCode),
    Failed(String),
}

impl CheckOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(self, CheckOutcome::Reachable(_))
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOutcome::Reachable(status) => write!(f, "OK ({})", status.as_u16()),
            CheckOutcome::HttpError(status) => write!(f, "HTTP {}", status.as_u16()),
            CheckOutcome::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub source: Source,
    pub outcome: CheckOutcome,
}

/// Checks that feed URLs answer at all, without parsing them.
pub struct ReachabilityChecker {
    client: Client,
}

impl ReachabilityChecker {
    pub fn new() -> Result<Self> {
        Self::with_timeout(std::time::Duration::from_secs(CHECK_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: std::time::Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// A source fails when the request errors or the status is 400 or above.
    pub async fn check(&self, source: &Source) -> CheckResult {
        let outcome = match self.client.get(&source.url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.as_u16() >= 400 {
                    CheckOutcome::HttpError(status)
                } else {
                    CheckOutcome::Reachable(status)
                }
            }
            Err(e) => CheckOutcome::Failed(e.to_string()),
        };
        debug!("{}: {}", source.name, outcome);

        CheckResult {
            source: source.clone(),
            outcome,
        }
    }

    /// Checks every source, at most `concurrency` at a time. Results come back
    /// in the same order as `sources`.
    pub async fn check_all(&self, sources: &[Source], concurrency: usize) -> Vec<CheckResult> {
        stream::iter(sources)
            .map(|source| self.check(source))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

/// Returns the number of failed sources, or an error naming them when there
/// are more than `max_failures`.
pub fn enforce_failure_budget(results: &[CheckResult], max_failures: usize) -> Result<usize> {
    let failures: Vec<&str> = results
        .iter()
        .filter(|result| result.outcome.is_failure())
        .map(|result| result.source.name.as_str())
        .collect();

    if failures.len() > max_failures {
        anyhow::bail!(
            "{} feeds unreachable (allowed {}): {}",
            failures.len(),
            max_failures,
            failures.join(", ")
        );
    }

    Ok(failures.len())
}
