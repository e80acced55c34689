//! The destroy cascade: hard, irreversible physical deletion.

use tracing::{debug, info, warn};

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::DocumentId;
use docvault_entity::history::DocumentEvent;

use crate::context::AuditContext;
use crate::coordinator::LifecycleCoordinator;

impl LifecycleCoordinator {
    /// Physically delete a document and everything attached to it:
    /// versions, aliases, links, bookmarks, tickets, notes, history, the
    /// document row, the index entry, and the content resources, in that
    /// order. Gated on a dedicated destroy capability.
    ///
    /// Every step logs its count. The bookmark and ticket steps tolerate
    /// failure (their tables may not exist in older schemas); the rest of
    /// the cascade continues regardless.
    pub async fn destroy_document(&self, doc_id: DocumentId, audit: &AuditContext) -> AppResult<()> {
        audit.validate()?;

        if !self.access.can_destroy(audit.actor.id).await? {
            return Err(AppError::authorization(format!(
                "User {} cannot destroy documents",
                audit.actor.username
            )));
        }

        let document = self.require_document(doc_id).await?;
        let tag = format!("{doc_id} - {}", document.file_name);
        debug!(doc_id = %doc_id, "Destroying document");

        let count = self.records.purge_versions(doc_id).await?;
        info!(count, document = %tag, "Destroyed versions of document");

        let count = self.records.purge_aliases(doc_id).await?;
        info!(count, document = %tag, "Destroyed aliases of document");

        let count = self.records.purge_links(doc_id).await?;
        info!(count, document = %tag, "Destroyed links of document");

        match self.records.purge_bookmarks(doc_id).await {
            Ok(count) => info!(count, document = %tag, "Destroyed bookmarks of document"),
            Err(e) => warn!(document = %tag, error = %e, "Skipping bookmark cleanup"),
        }

        match self.records.purge_tickets(doc_id).await {
            Ok(count) => info!(count, document = %tag, "Destroyed tickets of document"),
            Err(e) => warn!(document = %tag, error = %e, "Skipping ticket cleanup"),
        }

        let count = self.records.purge_notes(doc_id).await?;
        info!(count, document = %tag, "Destroyed notes of document");

        let count = self.records.purge_history(doc_id).await?;
        info!(count, document = %tag, "Destroyed history of document");

        self.records.purge_document(doc_id).await?;
        info!(document = %tag, "Destroyed the record of document");

        self.indexer.delete_hit(doc_id).await?;
        info!(document = %tag, "Destroyed the index entry of document");

        self.content.delete(doc_id, None).await?;
        info!(document = %tag, "Destroyed the content of document");

        // Record the destruction against the containing folder; the
        // document's own history is gone.
        let mut entry = audit.entry_for(&document, DocumentEvent::Destroyed);
        entry.path = self.records.folder_path(document.folder_id).await.ok();
        self.record_history(entry).await;

        info!(document = %tag, "Document has been completely destroyed");
        Ok(())
    }
}
