use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use haru_core::{CleanupReport, CrawlerStatus, IssueStore, Result, RunReport};

use crate::batch;
use crate::config::CrawlerConfig;
use crate::pipeline::CrawlPipeline;

/// Cooldown between scheduled runs.
const CRAWL_INTERVAL_DAYS: i64 = 30;

/// Pause between existence probes.
const DEFAULT_PROBE_DELAY: Duration = Duration::from_millis(500);

fn is_due(last_crawl: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_crawl {
        None => true,
        Some(last) => now >= last + ChronoDuration::days(CRAWL_INTERVAL_DAYS),
    }
}

fn days_until_next(last_crawl: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (last_crawl + ChronoDuration::days(CRAWL_INTERVAL_DAYS) - now).num_days()
}

/// Owns the persisted crawl configuration and drives the periodic
/// discover → crawl → clean up → persist cycle. The config mutex is held for
/// the whole of each run, so overlapping invocations serialize instead of
/// double-crawling or clobbering each other's writes.
pub struct ScheduledCrawler {
    pipeline: CrawlPipeline,
    store: Arc<dyn IssueStore>,
    config_path: PathBuf,
    config: Mutex<CrawlerConfig>,
    probe_delay: Duration,
}

impl ScheduledCrawler {
    pub fn new(
        pipeline: CrawlPipeline,
        store: Arc<dyn IssueStore>,
        config_path: impl Into<PathBuf>,
    ) -> Self {
        let config_path = config_path.into();
        let config = CrawlerConfig::load_or_default(&config_path);
        Self {
            pipeline,
            store,
            config_path,
            config: Mutex::new(config),
            probe_delay: DEFAULT_PROBE_DELAY,
        }
    }

    /// Shorten the pause between probes (tests).
    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    pub fn pipeline(&self) -> &CrawlPipeline {
        &self.pipeline
    }

    pub async fn status(&self) -> CrawlerStatus {
        let config = self.config.lock().await;
        let now = Utc::now();
        CrawlerStatus {
            last_crawled_number: config.last_crawled_number,
            last_crawl_date: config.last_crawl_date,
            days_until_next_crawl: config.last_crawl_date.map(|d| days_until_next(d, now)),
            max_articles_per_month: config.max_articles_per_month,
            auto_increment_limit: config.auto_increment_limit,
        }
    }

    pub async fn should_run_monthly(&self) -> bool {
        let config = self.config.lock().await;
        is_due(config.last_crawl_date, Utc::now())
    }

    /// Scan forward from `after` for article numbers that exist, stopping at
    /// the first miss or transport fault. Ids are assigned densely during
    /// publication, so the first gap marks the end of new content; the
    /// result is a contiguous ascending run starting at `after + 1`.
    pub async fn find_new_articles(&self, after: u32, max_look_ahead: u32) -> Vec<u32> {
        let mut found = Vec::new();
        for number in after + 1..=after.saturating_add(max_look_ahead) {
            match self.pipeline.fetcher().probe(number).await {
                Ok(true) => {
                    info!(number, "found new article");
                    found.push(number);
                }
                Ok(false) => {
                    info!(number, "article not found, stopping search");
                    break;
                }
                Err(e) => {
                    warn!(number, error = %e, "probe failed, stopping search");
                    break;
                }
            }
            tokio::time::sleep(self.probe_delay).await;
        }
        found
    }

    /// The monthly run: gate on the 30-day cooldown, discover new article
    /// numbers, crawl up to the per-month cap, retire as many old rows as
    /// were ingested, persist progress. Always returns a report.
    pub async fn monthly_crawl(&self) -> RunReport {
        let mut config = self.config.lock().await;
        let now = Utc::now();

        if let Some(last) = config.last_crawl_date {
            if !is_due(Some(last), now) {
                let days = days_until_next(last, now);
                return RunReport::Skipped {
                    message: format!("Monthly crawl not due yet. Next crawl in {days} days."),
                    days_until_next: days,
                    last_crawl: last,
                };
            }
        }

        let last_number = config.last_crawled_number;
        info!(from = last_number + 1, "searching for new articles");
        let found = self
            .find_new_articles(last_number, config.auto_increment_limit)
            .await;

        // The found run is contiguous and ascending, so capping keeps the
        // lowest numbers and the capped window stays gap-free.
        let cap = found.len().min(config.max_articles_per_month);
        let to_crawl = &found[..cap];

        let (Some(&start_number), Some(&end_number)) = (to_crawl.first(), to_crawl.last()) else {
            info!("no new articles found");
            config.last_crawl_date = Some(Utc::now());
            self.persist(&config);
            return RunReport::NoNewArticles {
                message: "No new articles found".to_string(),
                last_crawled_number: last_number,
            };
        };

        info!(
            found = found.len(),
            crawling = cap,
            start_number,
            end_number,
            "starting monthly crawl"
        );
        let results =
            batch::crawl_range(&self.pipeline, start_number, end_number, config.delay()).await;

        let successes: Vec<u32> = results
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.article_number())
            .collect();
        if let Some(&max_success) = successes.iter().max() {
            config.last_crawled_number = config.last_crawled_number.max(max_success);
        }

        let cleanup = if successes.is_empty() {
            None
        } else {
            info!(count = successes.len(), "cleaning up oldest articles");
            Some(self.cleanup_oldest(successes.len() as u64).await)
        };

        config.last_crawl_date = Some(Utc::now());
        self.persist(&config);

        RunReport::Completed {
            message: format!("Monthly crawl completed. Crawled {} articles.", successes.len()),
            articles_found: found.len(),
            articles_crawled: successes.len(),
            last_crawled_number: config.last_crawled_number,
            cleanup,
            results,
        }
    }

    /// Crawl a fixed window without the due-date gate. Progress is only
    /// persisted when at least one article succeeded, and the high-water
    /// mark never moves backwards.
    pub async fn manual_crawl_from(&self, start_number: u32, count: u32) -> RunReport {
        let mut config = self.config.lock().await;

        if count == 0 {
            return RunReport::Completed {
                message: "Manual crawl completed. Crawled 0 articles.".to_string(),
                articles_found: 0,
                articles_crawled: 0,
                last_crawled_number: config.last_crawled_number,
                cleanup: None,
                results: Vec::new(),
            };
        }

        let end_number = start_number + count - 1;
        info!(start_number, end_number, "starting manual crawl");
        let results =
            batch::crawl_range(&self.pipeline, start_number, end_number, config.delay()).await;

        let successes: Vec<u32> = results
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.article_number())
            .collect();
        if let Some(&max_success) = successes.iter().max() {
            config.last_crawled_number = config.last_crawled_number.max(max_success);
            self.persist(&config);
        }

        RunReport::Completed {
            message: format!("Manual crawl completed. Crawled {} articles.", successes.len()),
            articles_found: results.len(),
            articles_crawled: successes.len(),
            last_crawled_number: config.last_crawled_number,
            cleanup: None,
            results,
        }
    }

    /// Delete the `count` oldest rows to keep total storage roughly bounded.
    /// A store with `count` rows or fewer is left alone.
    pub async fn cleanup_oldest(&self, count: u64) -> CleanupReport {
        match self.try_cleanup(count).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "cleanup failed");
                CleanupReport::Error {
                    message: format!("Error cleaning up oldest articles: {e}"),
                    articles_deleted: 0,
                }
            }
        }
    }

    async fn try_cleanup(&self, count: u64) -> Result<CleanupReport> {
        let total = self.store.count().await?;
        if total <= count {
            info!(total, requested = count, "not enough articles to delete");
            return Ok(CleanupReport::Skipped {
                message: format!(
                    "Not enough articles to delete. Total: {total}, Requested: {count}"
                ),
                articles_deleted: 0,
            });
        }

        let oldest = self.store.oldest(count).await?;
        let ids: Vec<i64> = oldest.iter().map(|r| r.id).collect();
        let deleted = self.store.delete_by_ids(&ids).await?;
        info!(deleted, "deleted oldest articles");

        Ok(CleanupReport::Completed {
            message: format!("Deleted {deleted} oldest articles"),
            articles_deleted: deleted,
            deleted_articles: oldest,
        })
    }

    fn persist(&self, config: &CrawlerConfig) {
        if let Err(e) = config.save(&self.config_path) {
            warn!(
                path = %self.config_path.display(),
                error = %e,
                "failed to persist crawler config"
            );
        }
    }
}
