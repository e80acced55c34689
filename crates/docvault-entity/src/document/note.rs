//! Document note (annotation) entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use docvault_core::types::id::{DocumentId, UserId};

/// An annotation attached to a document, optionally pinned to one file
/// version.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentNote {
    /// Unique note identifier.
    pub id: Uuid,
    /// The annotated document.
    pub doc_id: DocumentId,
    /// File version the note is anchored to; `None` means the note
    /// follows the current content.
    pub file_version: Option<String>,
    /// Author.
    pub user_id: UserId,
    /// Author display name.
    pub username: String,
    /// Note body.
    pub message: String,
    /// When the note was written.
    pub created_at: DateTime<Utc>,
}
