use config::{Config, ConfigError};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

use crate::{Error, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    #[serde(default = "default_pipeline_id")]
    pub pipeline_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub silver: SilverConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff before the next attempt is `backoff_base ^ attempt` seconds.
    #[serde(default = "default_backoff_base")]
    pub backoff_base: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SilverConfig {
    /// Scan the whole silver root when the run date has no partition.
    #[serde(default = "default_fallback_to_root")]
    pub fallback_to_root: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    #[serde(default)]
    pub slack_webhook_url: Option<String>,
    #[serde(default)]
    pub teams_webhook_url: Option<String>,
    #[serde(default = "default_notification_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            timeout_secs: default_api_timeout(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base: default_backoff_base(),
        }
    }
}

impl Default for SilverConfig {
    fn default() -> Self {
        Self {
            fallback_to_root: default_fallback_to_root(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: None,
            teams_webhook_url: None,
            timeout_secs: default_notification_timeout(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            pipeline_id: default_pipeline_id(),
            api: ApiConfig::default(),
            retry: RetryConfig::default(),
            silver: SilverConfig::default(),
            notification: NotificationConfig::default(),
        }
    }
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_pipeline_id() -> String {
    "breweries".to_string()
}

fn default_base_url() -> String {
    "https://api.openbrewerydb.org/v1/breweries".to_string()
}

fn default_page_size() -> u32 {
    200
}

fn default_max_pages() -> u32 {
    200
}

fn default_api_timeout() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff_base() -> f64 {
    1.5
}

fn default_fallback_to_root() -> bool {
    true
}

fn default_notification_timeout() -> u64 {
    10
}

impl Settings {
    /// Loads settings from an optional TOML file, overridden by `APP_` environment
    /// variables (`APP_API__PAGE_SIZE=50`).
    pub fn new(path: &str) -> std::result::Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;

        debug!(
            data_root = %settings.data_root.display(),
            base_url = %settings.api.base_url,
            page_size = settings.api.page_size,
            max_pages = settings.api.max_pages,
            "Loaded pipeline settings"
        );

        Ok(settings)
    }

    pub fn load(path: &str) -> Result<Self> {
        let settings = Self::new(path)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api.base_url)?;

        if self.api.page_size == 0 {
            return Err(Error::InvalidInput("api.page_size must be greater than 0".into()));
        }
        if self.api.max_pages == 0 {
            return Err(Error::InvalidInput("api.max_pages must be greater than 0".into()));
        }
        if self.retry.max_retries == 0 {
            return Err(Error::InvalidInput("retry.max_retries must be greater than 0".into()));
        }
        if !(self.retry.backoff_base >= 1.0) {
            return Err(Error::InvalidInput(format!(
                "retry.backoff_base must be at least 1.0, got {}",
                self.retry.backoff_base
            )));
        }

        for url in [
            &self.notification.slack_webhook_url,
            &self.notification.teams_webhook_url,
        ]
        .into_iter()
        .flatten()
        {
            Url::parse(url)?;
        }

        Ok(())
    }
}
