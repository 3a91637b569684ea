//! Sequential batch crawling over a contiguous range of article numbers.
//! One request at a time with a fixed pause in between; the origin is never
//! hit concurrently.

use std::time::Duration;

use tracing::{info, warn};

use haru_core::CrawlOutcome;

use crate::pipeline::CrawlPipeline;

/// Crawl every number from `start_number` to `end_number` inclusive,
/// yielding one outcome per id in ascending order. Sleeps `delay` between
/// consecutive ids, not after the last. The range operation itself never
/// fails; per-id failures become tagged outcomes.
pub async fn crawl_range(
    pipeline: &CrawlPipeline,
    start_number: u32,
    end_number: u32,
    delay: Duration,
) -> Vec<CrawlOutcome> {
    let mut results = Vec::new();
    info!(start_number, end_number, "starting batch crawl");

    for number in start_number..=end_number {
        let url = pipeline.fetcher().article_url(number);
        match pipeline.crawl_url(&url).await {
            Ok(article) => {
                info!(number, title = %article.title, "crawled article");
                results.push(CrawlOutcome::Success {
                    article_number: number,
                    url,
                    title: article.title,
                    content_length: article.content.chars().count(),
                    reference: article.reference,
                });
            }
            Err(e) if e.is_handled() => {
                warn!(number, error = %e, "article failed");
                results.push(CrawlOutcome::Error {
                    article_number: number,
                    url,
                    error: e.to_string(),
                });
            }
            Err(e) => {
                warn!(number, error = %e, "unexpected failure");
                results.push(CrawlOutcome::Exception {
                    article_number: number,
                    url,
                    error: e.to_string(),
                });
            }
        }

        if number < end_number {
            tokio::time::sleep(delay).await;
        }
    }

    let successes = results.iter().filter(|r| r.is_success()).count();
    info!(
        total = results.len(),
        successes,
        errors = results.len() - successes,
        "batch crawl finished"
    );
    results
}

/// Crawl the `count` articles after `current_number`.
pub async fn crawl_next(
    pipeline: &CrawlPipeline,
    current_number: u32,
    count: u32,
    delay: Duration,
) -> Vec<CrawlOutcome> {
    if count == 0 {
        return Vec::new();
    }
    crawl_range(pipeline, current_number + 1, current_number + count, delay).await
}

/// Crawl the `count` articles before `current_number`.
pub async fn crawl_previous(
    pipeline: &CrawlPipeline,
    current_number: u32,
    count: u32,
    delay: Duration,
) -> Vec<CrawlOutcome> {
    if count == 0 || current_number <= 1 {
        return Vec::new();
    }
    let start_number = current_number.saturating_sub(count).max(1);
    crawl_range(pipeline, start_number, current_number - 1, delay).await
}
