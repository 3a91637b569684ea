use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use haru_core::{Error, Result};

/// The journal's article endpoint; tests point this at a local origin.
pub const DEFAULT_BASE_URL: &str = "https://kjcn.or.kr/journal/view.php";

/// Substring the site embeds in pages served for unknown article numbers.
pub const NOT_FOUND_MARKER: &str = "유효한 KJCN 저널 기사를 찾을 수 없습니다";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP access to the journal site. A single failure is terminal for the
/// requested id; there are no retries anywhere in the crawl core.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    base_url: String,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Canonical URL for an article number; also the stored reference key.
    pub fn article_url(&self, number: u32) -> String {
        format!("{}?number={}", self.base_url, number)
    }

    /// Fetch a page body. A non-2xx status is a transport failure.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("{url} returned status {status}")));
        }
        Ok(response.text().await?)
    }

    /// Existence probe: `Ok(true)` only for a 2xx page without the
    /// not-found marker. Transport faults bubble up so the scan can stop.
    pub async fn probe(&self, number: u32) -> Result<bool> {
        let url = self.article_url(number);
        let response = self.client.get(&url).timeout(PROBE_TIMEOUT).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(number, %status, "probe returned non-success status");
            return Ok(false);
        }
        let body = response.text().await?;
        Ok(!body.contains(NOT_FOUND_MARKER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_origin;

    #[test]
    fn article_url_appends_the_number() {
        let fetcher = Fetcher::new().unwrap();
        assert_eq!(
            fetcher.article_url(1669),
            "https://kjcn.or.kr/journal/view.php?number=1669"
        );
    }

    #[tokio::test]
    async fn probe_distinguishes_existing_and_missing_articles() {
        let base_url = test_origin::spawn(100..=102).await;
        let fetcher = Fetcher::with_base_url(base_url).unwrap();

        assert!(fetcher.probe(100).await.unwrap());
        assert!(fetcher.probe(102).await.unwrap());
        assert!(!fetcher.probe(103).await.unwrap());
    }

    #[tokio::test]
    async fn probe_treats_server_errors_as_missing() {
        let base_url = test_origin::spawn_erroring().await;
        let fetcher = Fetcher::with_base_url(base_url).unwrap();
        assert!(!fetcher.probe(100).await.unwrap());
    }

    #[tokio::test]
    async fn probe_fails_on_unreachable_origin() {
        // Nothing listens on this port; reserved by binding and dropping.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = Fetcher::with_base_url(format!("http://{addr}/journal/view.php")).unwrap();
        assert!(fetcher.probe(100).await.is_err());
    }

    #[tokio::test]
    async fn fetch_page_rejects_non_success_statuses() {
        let base_url = test_origin::spawn_erroring().await;
        let fetcher = Fetcher::with_base_url(base_url.clone()).unwrap();
        let err = fetcher.fetch_page(&base_url).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
