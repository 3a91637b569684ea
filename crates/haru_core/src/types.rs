use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored journal issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub reference: String,
    pub role: Option<String>,
    pub admin_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a row about to be stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    pub content: String,
    pub reference: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub admin_id: Option<i64>,
}

/// Partial update applied through the CRUD layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssuePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub reference: Option<String>,
}

impl IssuePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.reference.is_none()
    }
}

/// Minimal view of a row selected for retention cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSummary {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Per-id result of a batch crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CrawlOutcome {
    Success {
        article_number: u32,
        url: String,
        title: String,
        content_length: usize,
        reference: String,
    },
    Error {
        article_number: u32,
        url: String,
        error: String,
    },
    Exception {
        article_number: u32,
        url: String,
        error: String,
    },
}

impl CrawlOutcome {
    pub fn article_number(&self) -> u32 {
        match self {
            CrawlOutcome::Success { article_number, .. }
            | CrawlOutcome::Error { article_number, .. }
            | CrawlOutcome::Exception { article_number, .. } => *article_number,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CrawlOutcome::Success { .. })
    }
}

/// Result of a scheduled or manual crawl run. Crawl runs never raise; every
/// failure mode collapses into one of these variants.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunReport {
    Skipped {
        message: String,
        days_until_next: i64,
        last_crawl: DateTime<Utc>,
    },
    NoNewArticles {
        message: String,
        last_crawled_number: u32,
    },
    Completed {
        message: String,
        articles_found: usize,
        articles_crawled: usize,
        last_crawled_number: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        cleanup: Option<CleanupReport>,
        results: Vec<CrawlOutcome>,
    },
    Error {
        message: String,
    },
}

/// Result of a retention cleanup pass.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleanupReport {
    Skipped {
        message: String,
        articles_deleted: u64,
    },
    Completed {
        message: String,
        articles_deleted: u64,
        deleted_articles: Vec<IssueSummary>,
    },
    Error {
        message: String,
        articles_deleted: u64,
    },
}

impl CleanupReport {
    pub fn articles_deleted(&self) -> u64 {
        match self {
            CleanupReport::Skipped { articles_deleted, .. }
            | CleanupReport::Completed { articles_deleted, .. }
            | CleanupReport::Error { articles_deleted, .. } => *articles_deleted,
        }
    }
}

/// Crawler configuration snapshot exposed by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlerStatus {
    pub last_crawled_number: u32,
    pub last_crawl_date: Option<DateTime<Utc>>,
    pub days_until_next_crawl: Option<i64>,
    pub max_articles_per_month: usize,
    pub auto_increment_limit: u32,
}
