pub mod error;
pub mod models;
pub mod storage;
pub mod text;
pub mod types;

pub use error::{Error, ExtractionFailure};
pub use models::{Summarizer, VisionAnalyzer};
pub use storage::IssueStore;
pub use types::{
    CleanupReport, CrawlOutcome, CrawlerStatus, Issue, IssuePatch, IssueSummary, NewIssue,
    RunReport,
};

pub type Result<T> = std::result::Result<T, Error>;
