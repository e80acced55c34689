//! Document link entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use docvault_core::types::id::{DocumentId, TenantId};

/// A typed link between two documents.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentLink {
    /// Unique link identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// First endpoint.
    pub doc1: DocumentId,
    /// Second endpoint.
    pub doc2: DocumentId,
    /// Link type label (e.g. "default", "translation").
    pub link_type: String,
}
