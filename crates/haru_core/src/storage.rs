use async_trait::async_trait;

use crate::types::{Issue, IssuePatch, IssueSummary, NewIssue};
use crate::Result;

/// Storage of issue rows. Every operation is individually transactional;
/// callers tolerate each call failing on its own.
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Whether a row with this reference URL is already stored.
    async fn exists(&self, reference: &str) -> Result<bool>;

    /// Insert unless the reference is already stored. Returns whether a row
    /// was actually written; a duplicate is a reported skip, not an error.
    async fn insert(&self, new: &NewIssue) -> Result<bool>;

    async fn count(&self) -> Result<u64>;

    /// The `n` oldest rows by `created_at`, ascending.
    async fn oldest(&self, n: u64) -> Result<Vec<IssueSummary>>;

    /// Bulk delete; returns the number of rows the store actually removed.
    async fn delete_by_ids(&self, ids: &[i64]) -> Result<u64>;

    /// All rows, newest id first.
    async fn list(&self) -> Result<Vec<Issue>>;

    async fn get(&self, id: i64) -> Result<Option<Issue>>;

    /// Unconditional create for manual administration. A duplicate reference
    /// surfaces as a storage error here, unlike `insert`.
    async fn create(&self, new: &NewIssue) -> Result<Issue>;

    /// Apply a partial update; returns the updated row, or `None` when the
    /// id does not exist.
    async fn update(&self, id: i64, patch: &IssuePatch) -> Result<Option<Issue>>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool>;
}
