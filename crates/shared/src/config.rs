use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_EMAIL_FROM: &str = "News Digest <onboarding@resend.dev>";
pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";

const FIX_HINT: &str = "To fix this, create ~/.config/news-digest/.env with the variables \
    for your delivery channel, for example:\n  \
    SLACK_WEBHOOK_URL=https://hooks.slack.com/services/...\n  \
    ANTHROPIC_API_KEY=your_key_here\n  \
    RESEND_API_KEY=your_key_here\n  \
    DIGEST_EMAIL_TO=you@example.com";

/// Where the rendered digest goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Slack,
    Email,
}

impl FromStr for Channel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "slack" | "chat" => Ok(Channel::Slack),
            "email" => Ok(Channel::Email),
            other => anyhow::bail!("Unknown channel: {}. Use 'slack' or 'email'", other),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Slack => write!(f, "slack"),
            Channel::Email => write!(f, "email"),
        }
    }
}

/// What the current run needs from the environment
#[derive(Debug, Clone, Copy)]
pub struct Requirements {
    pub channel: Channel,
    pub clustering: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Slack {
        webhook_url: String,
    },
    Email {
        api_key: String,
        to: String,
        from: String,
    },
    /// Print instead of sending
    Stdout,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub delivery: Delivery,
}

impl Config {
    pub fn from_env(requirements: Requirements) -> Result<Self> {
        Self::try_load_dotenv();
        Self::from_lookup(requirements, |key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup. Every variable the
    /// run needs is checked here, before anything touches the network.
    pub fn from_lookup<F>(requirements: Requirements, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            get(key).with_context(|| format!("{} not found.\n\n{}", key, FIX_HINT))
        };

        let anthropic_api_key = if requirements.clustering {
            Some(require("ANTHROPIC_API_KEY")?)
        } else {
            get("ANTHROPIC_API_KEY")
        };

        let anthropic_model = get("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let delivery = if requirements.dry_run {
            Delivery::Stdout
        } else {
            match requirements.channel {
                Channel::Slack => {
                    let webhook_url = require("SLACK_WEBHOOK_URL")?;
                    validate_url("SLACK_WEBHOOK_URL", &webhook_url)?;
                    Delivery::Slack { webhook_url }
                }
                Channel::Email => {
                    let api_key = require("RESEND_API_KEY")?;
                    let to = require("DIGEST_EMAIL_TO")?;
                    if !to.contains('@') {
                        anyhow::bail!("DIGEST_EMAIL_TO is not an email address: {}", to);
                    }
                    let from =
                        get("DIGEST_EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string());
                    Delivery::Email { api_key, to, from }
                }
            }
        };

        Ok(Self {
            anthropic_api_key,
            anthropic_model,
            delivery,
        })
    }

    fn try_load_dotenv() {
        // 1. Current directory
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/news-digest/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("news-digest").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

fn validate_url(key: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value).with_context(|| format!("{} is not a valid URL", key))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("{} must be an http(s) URL, got scheme '{}'", key, parsed.scheme());
    }
    Ok(())
}
