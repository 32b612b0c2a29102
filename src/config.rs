use serde::Deserialize;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            api_base_url: std::env::var("API_BASE_URL")
                .map_err(|_| anyhow::anyhow!("API_BASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("API_BASE_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("API_BASE_URL must start with http:// or https://");
                    }
                    Ok(url)
                })?,
            api_token: std::env::var("API_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            http_timeout_secs: match std::env::var("HTTP_TIMEOUT_SECS") {
                Ok(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| {
                        anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a positive number of seconds")
                    })?,
                Err(_) => DEFAULT_TIMEOUT_SECS,
            },
        };

        // Never log the token itself
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("API Base URL: {}", config.api_base_url);
        tracing::debug!("API token configured: {}", config.api_token.is_some());
        tracing::debug!("HTTP timeout: {}s", config.http_timeout_secs);

        Ok(config)
    }

    /// Config for a given backend with defaults for everything else.
    pub fn for_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            api_token: None,
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
