use common::{Error, Result};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::client::PageClient;
use crate::models::Record;
use crate::utils::{retry_with_backoff, RetryPolicy};

/// Paginated, retrying accumulator over a `PageClient`.
pub struct Fetcher {
    client: Arc<dyn PageClient>,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Arc<dyn PageClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Walks pages 1..=max_pages and returns every record in request order.
    ///
    /// Stops at the first empty page, the first short page, or after
    /// `max_pages`. A page that keeps failing aborts the whole fetch.
    pub async fn fetch_all(&self, page_size: u32, max_pages: u32) -> Result<Vec<Record>> {
        let mut records = Vec::new();

        for page in 1..=max_pages {
            let rows = self.fetch_page(page, page_size).await?;
            let fetched = rows.len();
            debug!(page, fetched, "Fetched page");

            if rows.is_empty() {
                break;
            }
            records.extend(rows);
            if fetched < page_size as usize {
                break;
            }
        }

        info!(records = records.len(), "Extraction complete");
        Ok(records)
    }

    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Vec<Record>> {
        retry_with_backoff(&self.retry, |_attempt| self.client.get_page(page, page_size))
            .await
            .map_err(|exhausted| {
                error!(page, attempts = exhausted.attempts, error = %exhausted.last_error, "Giving up on page");
                Error::FetchFailed {
                    page,
                    attempts: exhausted.attempts,
                    reason: exhausted.last_error.to_string(),
                }
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed script of page responses and records every request.
    pub(crate) struct ScriptedClient {
        script: Mutex<VecDeque<Result<Vec<Record>>>>,
        pub(crate) requests: Mutex<Vec<(u32, u32)>>,
    }

    impl ScriptedClient {
        pub(crate) fn new(script: Vec<Result<Vec<Record>>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageClient for ScriptedClient {
        async fn get_page(&self, page: u32, per_page: u32) -> Result<Vec<Record>> {
            self.requests.lock().unwrap().push((page, per_page));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    pub(crate) fn page(ids: std::ops::Range<u32>) -> Vec<Record> {
        ids.map(|id| {
            json!({ "id": id.to_string(), "name": format!("Brewery {}", id) })
                .as_object()
                .cloned()
                .unwrap()
        })
        .collect()
    }

    fn fetcher(client: Arc<ScriptedClient>) -> Fetcher {
        Fetcher::new(client, RetryPolicy::new(5, 1.5))
    }

    #[tokio::test]
    async fn stops_on_short_page() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(page(0..3)),
            Ok(page(3..6)),
            Ok(page(6..7)),
            Ok(page(7..10)),
        ]));

        let records = fetcher(client.clone()).fetch_all(3, 10).await.unwrap();

        assert_eq!(records.len(), 7);
        assert_eq!(records[6]["id"], "6");
        assert_eq!(*client.requests.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn stops_on_empty_first_page() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(Vec::new()), Ok(page(0..3))]));

        let records = fetcher(client.clone()).fetch_all(3, 10).await.unwrap();

        assert!(records.is_empty());
        assert_eq!(client.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stops_at_max_pages() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(page(0..2)),
            Ok(page(2..4)),
            Ok(page(4..6)),
        ]));

        let records = fetcher(client.clone()).fetch_all(2, 2).await.unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(client.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_failed_page_then_continues() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(page(0..2)),
            Err(Error::GatewayTimeout),
            Err(Error::HttpStatus { status: 500, url: "http://api".into() }),
            Ok(page(2..3)),
        ]));

        let records = fetcher(client.clone()).fetch_all(2, 10).await.unwrap();

        assert_eq!(records.len(), 3);
        let pages: Vec<u32> = client.requests.lock().unwrap().iter().map(|r| r.0).collect();
        assert_eq!(pages, vec![1, 2, 2, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_fail_the_fetch() {
        let client = Arc::new(ScriptedClient::new(
            (0..5).map(|_| Err(Error::RateLimit)).collect(),
        ));

        let err = fetcher(client.clone()).fetch_all(2, 10).await.unwrap_err();

        match err {
            Error::FetchFailed { page, attempts, .. } => {
                assert_eq!(page, 1);
                assert_eq!(attempts, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(client.requests.lock().unwrap().len(), 5);
    }
}
