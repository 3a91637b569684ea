use std::sync::Arc;

use tracing::{info, warn};

use haru_core::text::{chunk_text, is_mostly_english};
use haru_core::{IssueStore, NewIssue, Result, Summarizer};

use crate::extractor;
use crate::fetcher::Fetcher;

/// Crawler inserts are attributed to the fixed admin account.
const CRAWLER_ROLE: &str = "ADMIN";
const CRAWLER_ADMIN_ID: i64 = 8;

/// Upper bound on the text handed to a single summarize call.
const MAX_CHUNK_CHARS: usize = 3000;

const TITLE_MAX_WORDS: usize = 5;

/// Summary length when the model is unavailable and we truncate locally.
const FALLBACK_SUMMARY_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct CrawledArticle {
    pub title: String,
    pub content: String,
    pub reference: String,
    /// False when the reference was already stored (duplicate skip).
    pub inserted: bool,
}

/// Fetch → extract → title → summarize → store, for one article at a time.
pub struct CrawlPipeline {
    fetcher: Fetcher,
    summarizer: Arc<dyn Summarizer>,
    store: Arc<dyn IssueStore>,
}

impl CrawlPipeline {
    pub fn new(fetcher: Fetcher, summarizer: Arc<dyn Summarizer>, store: Arc<dyn IssueStore>) -> Self {
        Self {
            fetcher,
            summarizer,
            store,
        }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub async fn crawl_url(&self, url: &str) -> Result<CrawledArticle> {
        let page = self.fetcher.fetch_page(url).await?;
        let article = extractor::extract(&page)?;

        let title = self.short_korean_title(&article.title).await;
        let content = self.summarize_body(&article.body).await;

        let inserted = self
            .store
            .insert(&NewIssue {
                title: title.clone(),
                content: content.clone(),
                reference: url.to_string(),
                role: Some(CRAWLER_ROLE.to_string()),
                admin_id: Some(CRAWLER_ADMIN_ID),
            })
            .await?;
        if inserted {
            info!(url, title = %title, "stored crawled article");
        } else {
            info!(url, "reference already stored, skipping insert");
        }

        Ok(CrawledArticle {
            title,
            content,
            reference: url.to_string(),
            inserted,
        })
    }

    pub async fn crawl_number(&self, number: u32) -> Result<CrawledArticle> {
        self.crawl_url(&self.fetcher.article_url(number)).await
    }

    /// Short Korean title: English titles are translated first, then
    /// condensed. Model failures degrade to local truncation instead of
    /// failing the crawl.
    async fn short_korean_title(&self, title: &str) -> String {
        let korean = if is_mostly_english(title) {
            match self.summarizer.translate_to_korean(title).await {
                Ok(translated) => translated,
                Err(e) => {
                    warn!(error = %e, "title translation failed, keeping original title");
                    title.to_string()
                }
            }
        } else {
            title.to_string()
        };

        match self.summarizer.shorten_title(&korean, TITLE_MAX_WORDS).await {
            Ok(short) => short,
            Err(e) => {
                warn!(error = %e, "title shortening failed, truncating locally");
                fallback_title(&korean, TITLE_MAX_WORDS)
            }
        }
    }

    /// Summarize the body chunk by chunk, concatenating in order. A failed
    /// chunk degrades to its own truncation.
    async fn summarize_body(&self, body: &str) -> String {
        let mut summaries = Vec::new();
        for chunk in chunk_text(body, MAX_CHUNK_CHARS) {
            match self.summarizer.summarize(&chunk).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    warn!(error = %e, "summarization failed, truncating chunk");
                    summaries.push(truncate_chars(&chunk, FALLBACK_SUMMARY_CHARS));
                }
            }
        }
        summaries.join("\n")
    }
}

fn fallback_title(title: &str, max_words: usize) -> String {
    if is_mostly_english(title) {
        title
            .split_whitespace()
            .take(max_words)
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        truncate_chars(title, 20)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_origin;
    use async_trait::async_trait;
    use haru_core::Error;
    use haru_inference::DummyModel;
    use haru_storage::MemoryStore;

    /// Summarizer whose every call fails, to drive the fallback paths.
    struct BrokenModel;

    #[async_trait]
    impl Summarizer for BrokenModel {
        fn name(&self) -> &str {
            "broken"
        }

        async fn summarize(&self, _text: &str) -> Result<String> {
            Err(Error::Inference("model unavailable".to_string()))
        }

        async fn translate_to_korean(&self, _text: &str) -> Result<String> {
            Err(Error::Inference("model unavailable".to_string()))
        }

        async fn shorten_title(&self, _title: &str, _max_words: usize) -> Result<String> {
            Err(Error::Inference("model unavailable".to_string()))
        }
    }

    fn pipeline_against(base_url: String, summarizer: Arc<dyn Summarizer>) -> CrawlPipeline {
        CrawlPipeline::new(
            Fetcher::with_base_url(base_url).unwrap(),
            summarizer,
            Arc::new(MemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn crawls_and_stores_a_valid_article() {
        let base_url = test_origin::spawn(100..=100).await;
        let store = Arc::new(MemoryStore::new());
        let pipeline = CrawlPipeline::new(
            Fetcher::with_base_url(base_url).unwrap(),
            Arc::new(DummyModel),
            store.clone(),
        );

        let article = pipeline.crawl_number(100).await.unwrap();
        assert!(article.inserted);
        assert!(!article.title.is_empty());
        assert!(!article.content.is_empty());
        assert!(store.exists(&article.reference).await.unwrap());
    }

    #[tokio::test]
    async fn second_crawl_of_the_same_url_is_a_duplicate_skip() {
        let base_url = test_origin::spawn(100..=100).await;
        let store = Arc::new(MemoryStore::new());
        let pipeline = CrawlPipeline::new(
            Fetcher::with_base_url(base_url).unwrap(),
            Arc::new(DummyModel),
            store.clone(),
        );

        assert!(pipeline.crawl_number(100).await.unwrap().inserted);
        assert!(!pipeline.crawl_number(100).await.unwrap().inserted);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn not_found_page_is_never_a_success() {
        let base_url = test_origin::spawn(100..=100).await;
        let pipeline = pipeline_against(base_url, Arc::new(DummyModel));

        let err = pipeline.crawl_number(999).await.unwrap_err();
        assert!(err.is_handled());
    }

    #[tokio::test]
    async fn model_failures_degrade_to_truncation() {
        let base_url = test_origin::spawn(100..=100).await;
        let store = Arc::new(MemoryStore::new());
        let pipeline = CrawlPipeline::new(
            Fetcher::with_base_url(base_url).unwrap(),
            Arc::new(BrokenModel),
            store.clone(),
        );

        let article = pipeline.crawl_number(100).await.unwrap();
        // The crawl still succeeds and stores locally-truncated text.
        assert!(article.inserted);
        assert!(!article.title.is_empty());
        assert!(!article.content.is_empty());
        assert!(article.content.chars().count() <= FALLBACK_SUMMARY_CHARS + 3);
    }

    #[test]
    fn fallback_title_truncates_by_language() {
        let english = "A very long English journal article title with many words";
        assert_eq!(
            fallback_title(english, 5),
            "A very long English journal"
        );

        let korean = "아주 긴 한국어 저널 기사 제목이 여기에 있다 그리고 더 길다";
        let fallback = fallback_title(korean, 5);
        assert!(fallback.chars().count() <= 23);
    }
}
