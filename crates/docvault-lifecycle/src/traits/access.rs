//! Access control contract.

use async_trait::async_trait;

use docvault_core::result::AppResult;
use docvault_core::types::id::{FolderId, UserId};

/// Folder-level permissions the coordinator checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Write documents into the folder.
    Write,
    /// Archive documents contained in the folder.
    Archive,
    /// Download document content from the folder.
    Download,
}

/// External authorization: the coordinator asks, it never decides.
/// Administrators are recognized on the [`crate::Actor`] itself and
/// bypass these checks where the operation says so.
#[async_trait]
pub trait AccessControl: Send + Sync + 'static {
    /// Whether the user holds the permission on the folder.
    async fn is_allowed(
        &self,
        user_id: UserId,
        folder_id: FolderId,
        permission: Permission,
    ) -> AppResult<bool>;

    /// Whether the user may physically destroy documents.
    async fn can_destroy(&self, user_id: UserId) -> AppResult<bool>;
}
