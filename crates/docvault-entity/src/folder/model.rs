//! Folder entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::id::{FolderId, TenantId};

/// A folder in the containment tree. Every document belongs to exactly
/// one folder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Parent folder; `None` for a root.
    pub parent_id: Option<FolderId>,
    /// Folder name.
    pub name: String,
    /// Storage tier pinned for documents under this folder. When unset,
    /// the nearest pinned ancestor (or the configured default) applies.
    pub store_tier: Option<i32>,
}

impl Folder {
    /// Build a root folder.
    pub fn root(tenant_id: TenantId, name: impl Into<String>) -> Self {
        Self {
            id: FolderId::new(),
            tenant_id,
            parent_id: None,
            name: name.into(),
            store_tier: None,
        }
    }

    /// Build a child of this folder.
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self {
            id: FolderId::new(),
            tenant_id: self.tenant_id,
            parent_id: Some(self.id),
            name: name.into(),
            store_tier: None,
        }
    }
}
