use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use haru_core::{Error, Issue, IssuePatch, IssueStore, IssueSummary, NewIssue, Result};

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: Vec<Issue>,
}

/// In-memory store for tests and development runs. Ids are assigned in
/// insertion order; `oldest` tie-breaks equal timestamps by id so ordering
/// stays deterministic.
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                next_id: 1,
                rows: Vec::new(),
            })),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn push_row(&mut self, new: &NewIssue) -> Issue {
        let now = Utc::now();
        let row = Issue {
            id: self.next_id,
            title: new.title.clone(),
            content: new.content.clone(),
            reference: new.reference.clone(),
            role: new.role.clone(),
            admin_id: new.admin_id,
            created_at: now,
            updated_at: now,
        };
        self.next_id += 1;
        self.rows.push(row.clone());
        row
    }
}

#[async_trait]
impl IssueStore for MemoryStore {
    async fn exists(&self, reference: &str) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().any(|r| r.reference == reference))
    }

    async fn insert(&self, new: &NewIssue) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.rows.iter().any(|r| r.reference == new.reference) {
            return Ok(false);
        }
        inner.push_row(new);
        Ok(true)
    }

    async fn count(&self) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner.rows.len() as u64)
    }

    async fn oldest(&self, n: u64) -> Result<Vec<IssueSummary>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<&Issue> = inner.rows.iter().collect();
        rows.sort_by_key(|r| (r.created_at, r.id));
        Ok(rows
            .into_iter()
            .take(n as usize)
            .map(|r| IssueSummary {
                id: r.id,
                title: r.title.clone(),
                created_at: r.created_at,
            })
            .collect())
    }

    async fn delete_by_ids(&self, ids: &[i64]) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.rows.len();
        inner.rows.retain(|r| !ids.contains(&r.id));
        Ok((before - inner.rows.len()) as u64)
    }

    async fn list(&self) -> Result<Vec<Issue>> {
        let inner = self.inner.read().await;
        let mut rows = inner.rows.clone();
        rows.sort_by_key(|r| std::cmp::Reverse(r.id));
        Ok(rows)
    }

    async fn get(&self, id: i64) -> Result<Option<Issue>> {
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, new: &NewIssue) -> Result<Issue> {
        let mut inner = self.inner.write().await;
        if inner.rows.iter().any(|r| r.reference == new.reference) {
            return Err(Error::Storage(format!(
                "reference already stored: {}",
                new.reference
            )));
        }
        Ok(inner.push_row(new))
    }

    async fn update(&self, id: i64, patch: &IssuePatch) -> Result<Option<Issue>> {
        let mut inner = self.inner.write().await;
        let Some(row) = inner.rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            row.title = title.clone();
        }
        if let Some(content) = &patch.content {
            row.content = content.clone();
        }
        if let Some(reference) = &patch.reference {
            row.reference = reference.clone();
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.rows.len();
        inner.rows.retain(|r| r.id != id);
        Ok(inner.rows.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(reference: &str) -> NewIssue {
        NewIssue {
            title: format!("title for {reference}"),
            content: "요약 내용".to_string(),
            reference: reference.to_string(),
            role: Some("ADMIN".to_string()),
            admin_id: Some(8),
        }
    }

    #[tokio::test]
    async fn insert_is_idempotent_on_reference() {
        let store = MemoryStore::new();
        assert!(store.insert(&issue("http://a/1")).await.unwrap());
        assert!(!store.insert(&issue("http://a/1")).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn oldest_returns_insertion_order() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.insert(&issue(&format!("http://a/{i}"))).await.unwrap();
        }
        let oldest = store.oldest(3).await.unwrap();
        let ids: Vec<i64> = oldest.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn delete_by_ids_reports_actual_count() {
        let store = MemoryStore::new();
        for i in 0..3 {
            store.insert(&issue(&format!("http://a/{i}"))).await.unwrap();
        }
        // id 99 does not exist; only two rows go away.
        let deleted = store.delete_by_ids(&[1, 2, 99]).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn crud_roundtrip() {
        let store = MemoryStore::new();
        let created = store.create(&issue("http://a/1")).await.unwrap();
        assert_eq!(created.id, 1);

        let patch = IssuePatch {
            title: Some("새 제목".to_string()),
            ..Default::default()
        };
        let updated = store.update(created.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.title, "새 제목");
        assert_eq!(updated.content, created.content);

        assert!(store.update(999, &patch).await.unwrap().is_none());

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        assert!(store.get(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_reference() {
        let store = MemoryStore::new();
        store.create(&issue("http://a/1")).await.unwrap();
        assert!(store.create(&issue("http://a/1")).await.is_err());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryStore::new();
        for i in 0..3 {
            store.insert(&issue(&format!("http://a/{i}"))).await.unwrap();
        }
        let rows = store.list().await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
