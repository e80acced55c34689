//! PostgreSQL history sink.

use async_trait::async_trait;
use sqlx::PgPool;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_entity::history::HistoryEntry;
use docvault_lifecycle::traits::HistorySink;

/// Append-only history sink backed by PostgreSQL.
///
/// Writes go to their own table with no foreign keys into the document
/// tables: history must survive the documents it describes.
#[derive(Debug, Clone)]
pub struct PgHistorySink {
    pool: PgPool,
}

impl PgHistorySink {
    /// Create a new history sink on the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistorySink for PgHistorySink {
    async fn store(&self, entry: &HistoryEntry) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO document_history (id, tenant_id, doc_id, folder_id, version, \
             file_version, event, comment, reason, file_name, previous_file_name, path, \
             previous_path, user_id, username, session_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(entry.id)
        .bind(entry.tenant_id)
        .bind(entry.doc_id)
        .bind(entry.folder_id)
        .bind(&entry.version)
        .bind(&entry.file_version)
        .bind(&entry.event)
        .bind(&entry.comment)
        .bind(&entry.reason)
        .bind(&entry.file_name)
        .bind(&entry.previous_file_name)
        .bind(&entry.path)
        .bind(&entry.previous_path)
        .bind(entry.user_id)
        .bind(&entry.username)
        .bind(&entry.session_id)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to append history entry", e)
        })?;
        Ok(())
    }
}
