use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;

use haru_core::{Error, Issue, IssuePatch, IssueStore, IssueSummary, NewIssue, Result};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS issues (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        reference TEXT NOT NULL UNIQUE,
        role TEXT,
        admin_id INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_issues_created_at ON issues(created_at)
    "#,
];

/// SQLite-backed issue store. Timestamps are persisted as RFC 3339 text.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("failed to open database: {e}")))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("failed to run migration {i}: {e}")))?;
        }

        Ok(Self { pool })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("invalid timestamp {raw:?}: {e}")))
}

fn row_to_issue(row: &SqliteRow) -> Result<Issue> {
    Ok(Issue {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        reference: row.get("reference"),
        role: row.get("role"),
        admin_id: row.get("admin_id"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

#[async_trait]
impl IssueStore for SqliteStore {
    async fn exists(&self, reference: &str) -> Result<bool> {
        let row = sqlx::query("SELECT id FROM issues WHERE reference = ?")
            .bind(reference)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to check reference: {e}")))?;
        Ok(row.is_some())
    }

    async fn insert(&self, new: &NewIssue) -> Result<bool> {
        if self.exists(&new.reference).await? {
            return Ok(false);
        }
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO issues (title, content, reference, role, admin_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.title)
        .bind(&new.content)
        .bind(&new.reference)
        .bind(&new.role)
        .bind(new.admin_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to insert issue: {e}")))?;
        Ok(true)
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM issues")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to count issues: {e}")))?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn oldest(&self, n: u64) -> Result<Vec<IssueSummary>> {
        let rows = sqlx::query(
            "SELECT id, title, created_at FROM issues ORDER BY created_at ASC, id ASC LIMIT ?",
        )
        .bind(n as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to select oldest issues: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(IssueSummary {
                    id: row.get("id"),
                    title: row.get("title"),
                    created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
                })
            })
            .collect()
    }

    async fn delete_by_ids(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!("DELETE FROM issues WHERE id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to delete issues: {e}")))?;
        Ok(result.rows_affected())
    }

    async fn list(&self) -> Result<Vec<Issue>> {
        let rows = sqlx::query("SELECT * FROM issues ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to list issues: {e}")))?;
        rows.iter().map(row_to_issue).collect()
    }

    async fn get(&self, id: i64) -> Result<Option<Issue>> {
        let row = sqlx::query("SELECT * FROM issues WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch issue {id}: {e}")))?;
        row.as_ref().map(row_to_issue).transpose()
    }

    async fn create(&self, new: &NewIssue) -> Result<Issue> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO issues (title, content, reference, role, admin_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.title)
        .bind(&new.content)
        .bind(&new.reference)
        .bind(&new.role)
        .bind(new.admin_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to create issue: {e}")))?;

        let id = result.last_insert_rowid();
        self.get(id)
            .await?
            .ok_or_else(|| Error::Storage(format!("created issue {id} not found")))
    }

    async fn update(&self, id: i64, patch: &IssuePatch) -> Result<Option<Issue>> {
        let Some(current) = self.get(id).await? else {
            return Ok(None);
        };

        let title = patch.title.as_ref().unwrap_or(&current.title);
        let content = patch.content.as_ref().unwrap_or(&current.content);
        let reference = patch.reference.as_ref().unwrap_or(&current.reference);

        sqlx::query(
            "UPDATE issues SET title = ?, content = ?, reference = ?, updated_at = ? WHERE id = ?",
        )
        .bind(title)
        .bind(content)
        .bind(reference)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to update issue {id}: {e}")))?;

        self.get(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM issues WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to delete issue {id}: {e}")))?;
        Ok(result.rows_affected() > 0)
    }
}
