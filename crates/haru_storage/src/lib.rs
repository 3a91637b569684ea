use std::path::Path;
use std::sync::Arc;

use haru_core::{Error, IssueStore, Result};

pub mod backends;

pub use backends::memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use backends::sqlite::SqliteStore;

/// Build a store by backend name, as selected on the command line.
pub async fn create_store(kind: &str, db_path: &Path) -> Result<Arc<dyn IssueStore>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Arc::new(SqliteStore::open(db_path).await?)),
        other => Err(Error::Storage(format!(
            "unknown storage backend: {} (db path {})",
            other,
            db_path.display()
        ))),
    }
}
