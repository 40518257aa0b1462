use async_trait::async_trait;
use common::config::ApiConfig;
use common::{Error, Result};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::models::Record;

/// Source of one page of raw records.
#[async_trait]
pub trait PageClient: Send + Sync {
    /// Fetches a single page. Any error is treated as transient by the caller.
    async fn get_page(&self, page: u32, per_page: u32) -> Result<Vec<Record>>;
}

/// `PageClient` over the public brewery HTTP API.
pub struct HttpPageClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpPageClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, base_url })
    }
}

#[async_trait]
impl PageClient for HttpPageClient {
    async fn get_page(&self, page: u32, per_page: u32) -> Result<Vec<Record>> {
        debug!(url = %self.base_url, page, per_page, "Requesting page");

        let response = self
            .http
            .get(self.base_url.clone())
            .query(&[("per_page", per_page), ("page", page)])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json::<Vec<Record>>().await?),
            StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimit),
            StatusCode::FORBIDDEN => Err(Error::Forbidden),
            StatusCode::GATEWAY_TIMEOUT => Err(Error::GatewayTimeout),
            status => Err(Error::HttpStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            }),
        }
    }
}
