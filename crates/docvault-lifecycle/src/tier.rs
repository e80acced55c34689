//! Storage tier enforcement across a folder tree.

use tracing::{error, info};

use docvault_core::result::AppResult;
use docvault_core::types::id::FolderId;
use docvault_entity::folder::Folder;
use docvault_entity::history::DocumentEvent;

use crate::context::AuditContext;
use crate::coordinator::LifecycleCoordinator;

impl LifecycleCoordinator {
    /// Walk the folder tree under `root_folder_id` and move every
    /// document's resources into the tier its folder resolves to.
    /// Returns the total number of resources moved.
    pub async fn enforce_folder_tier(
        &self,
        root_folder_id: FolderId,
        audit: &AuditContext,
    ) -> AppResult<u32> {
        audit.validate()?;

        let root = self.require_folder(root_folder_id).await?;
        let mut total = 0u32;

        for folder_id in self.records.find_folder_ids_in_tree(root.id).await? {
            let Some(folder) = self.records.find_folder(folder_id).await? else {
                continue;
            };
            let tier = self.resolve_tier(&folder).await;
            info!(folder = %folder.name, tier, "Enforcing storage tier for folder content");

            for document in self.records.find_documents_by_folder(folder_id).await? {
                let moved = self
                    .content
                    .move_resources_to_tier(document.id, tier)
                    .await?;
                if moved > 0 {
                    total += moved;
                    let mut entry = audit.entry_for(&document, DocumentEvent::Changed);
                    entry.comment = Some(format!("{moved} files moved to tier {tier}"));
                    self.record_history(entry).await;
                }
            }
        }

        Ok(total)
    }

    /// The tier a folder's content belongs in: its own pin, else the
    /// nearest pinned ancestor, else the configured default.
    async fn resolve_tier(&self, folder: &Folder) -> i32 {
        if let Some(tier) = folder.store_tier {
            return tier;
        }
        match self.records.find_folder_parents(folder.id).await {
            Ok(parents) => parents
                .iter()
                .find_map(|parent| parent.store_tier)
                .unwrap_or(self.config.default_tier),
            Err(e) => {
                error!(folder = %folder.id, error = %e, "Cannot resolve folder ancestry");
                self.config.default_tier
            }
        }
    }
}
