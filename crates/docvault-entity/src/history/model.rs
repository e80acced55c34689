//! History entry entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use docvault_core::types::id::{DocumentId, FolderId, TenantId, UserId};

/// One append-only audit record describing a lifecycle event.
///
/// History is written to its own sink, independent of the record store's
/// transaction: a failed history write never rolls back the operation it
/// describes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    /// Unique entry identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// The document concerned, when the event targets one.
    pub doc_id: Option<DocumentId>,
    /// The folder concerned.
    pub folder_id: Option<FolderId>,
    /// Document version at event time.
    pub version: Option<String>,
    /// Document file version at event time.
    pub file_version: Option<String>,
    /// Event code (see [`super::DocumentEvent`]).
    pub event: String,
    /// Free-text comment.
    pub comment: Option<String>,
    /// Machine-readable reason (e.g. the previous indexing state).
    pub reason: Option<String>,
    /// File name at event time.
    pub file_name: Option<String>,
    /// Previous file name for renames.
    pub previous_file_name: Option<String>,
    /// Folder path at event time.
    pub path: Option<String>,
    /// Previous folder path for moves.
    pub previous_path: Option<String>,
    /// Acting user.
    pub user_id: UserId,
    /// Acting user's display name.
    pub username: String,
    /// Session the action originated from, if any.
    pub session_id: Option<String>,
    /// When the event happened.
    pub created_at: DateTime<Utc>,
}
