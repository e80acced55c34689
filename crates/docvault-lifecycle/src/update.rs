//! Metadata update, rename, and move.

use tracing::debug;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::{DocumentId, FolderId};
use docvault_entity::document::model::TYPE_UNKNOWN;
use docvault_entity::document::{DocumentUpdate, IndexingState};
use docvault_entity::history::DocumentEvent;

use crate::context::AuditContext;
use crate::coordinator::LifecycleCoordinator;

impl LifecycleCoordinator {
    /// Apply a metadata patch as a new minor version.
    ///
    /// Immutable documents reject the update unless the actor is an
    /// administrator. A locale change deletes the existing index hit
    /// outright: the extracted content is wrong under the new locale,
    /// not merely stale.
    pub async fn update(
        &self,
        doc_id: DocumentId,
        update: &DocumentUpdate,
        audit: &AuditContext,
    ) -> AppResult<()> {
        audit.validate()?;

        let _guard = self.serial.lock().await;

        let mut document = self.require_document(doc_id).await?;

        if document.immutable && !audit.actor.admin {
            return Err(AppError::immutable(format!(
                "Document {} is immutable",
                document.label()
            )));
        }

        let renamed = update
            .file_name
            .as_ref()
            .is_some_and(|name| !name.is_empty() && *name != document.file_name);
        let previous_file_name = renamed.then(|| document.file_name.clone());

        self.enforce_custom_id_unique(&document, update.custom_id.as_deref())
            .await?;

        document.indexed = IndexingState::ToIndex;

        if let Some(locale) = &update.locale {
            if *locale != document.locale {
                self.indexer.delete_hit(document.id).await?;
            }
        }

        document.apply_update(update);

        let version = self.ledger.mint(
            &mut document,
            &audit.actor,
            audit.comment.as_deref(),
            DocumentEvent::Changed,
            false,
        );

        self.records.store_document(&document).await?;

        let event = if renamed {
            DocumentEvent::Renamed
        } else {
            DocumentEvent::Changed
        };
        let mut entry = audit.entry_for(&document, event);
        entry.previous_file_name = previous_file_name;
        self.record_history(entry).await;

        // The metadata version is written inline; there is no content
        // write racing ahead of the record here.
        self.records.store_version(&version).await?;

        self.records.mark_aliases_to_index(document.id).await?;

        debug!(doc_id = %doc_id, version = %document.version, "Updated document");
        Ok(())
    }

    /// Change the file name (and derived type) as a new minor version.
    pub async fn rename(
        &self,
        doc_id: DocumentId,
        new_name: &str,
        audit: &AuditContext,
    ) -> AppResult<()> {
        audit.validate()?;
        if new_name.trim().is_empty() {
            return Err(AppError::validation("File name is mandatory"));
        }

        let _guard = self.serial.lock().await;

        let mut document = self.require_document(doc_id).await?;

        if document.immutable && !audit.actor.admin {
            return Err(AppError::immutable(format!(
                "Document {} is immutable",
                document.label()
            )));
        }

        let previous_file_name = document.file_name.clone();
        document.file_name = new_name.trim().to_string();
        document.file_type = document
            .extension()
            .unwrap_or_else(|| TYPE_UNKNOWN.to_string());
        document.indexed = IndexingState::ToIndex;

        let version = self.ledger.mint(
            &mut document,
            &audit.actor,
            audit.comment.as_deref(),
            DocumentEvent::Renamed,
            false,
        );
        self.ledger.persist_async(version);

        self.records.store_document(&document).await?;
        let mut entry = audit.entry_for(&document, DocumentEvent::Renamed);
        entry.previous_file_name = Some(previous_file_name);
        self.record_history(entry).await;

        self.records.mark_aliases_to_index(doc_id).await?;

        debug!(doc_id = %doc_id, "Document renamed");
        Ok(())
    }

    /// Move a document into another folder as a new minor version.
    ///
    /// Moving into the current folder is a no-op. When the document was
    /// indexed its hit is deleted and every alias goes back to the
    /// indexing queue, since index paths carry folder information.
    pub async fn move_to_folder(
        &self,
        doc_id: DocumentId,
        folder_id: FolderId,
        audit: &AuditContext,
    ) -> AppResult<()> {
        audit.validate()?;

        let folder = self.require_folder(folder_id).await?;

        let _guard = self.serial.lock().await;

        let mut document = self.require_document(doc_id).await?;
        if document.folder_id == folder.id {
            return Ok(());
        }

        if document.immutable && !audit.actor.admin {
            return Err(AppError::immutable(format!(
                "Document {} is immutable",
                document.label()
            )));
        }

        let previous_path = self
            .records
            .folder_path(document.folder_id)
            .await
            .unwrap_or_default();

        document.folder_id = folder.id;

        if document.indexed == IndexingState::Indexed {
            document.indexed = IndexingState::ToIndex;
            self.indexer.delete_hit(document.id).await?;
            // The aliases present the referenced document under their own
            // paths; they must be re-indexed as well.
            self.records.mark_aliases_to_index(document.id).await?;
        }

        let version = self.ledger.mint(
            &mut document,
            &audit.actor,
            audit.comment.as_deref(),
            DocumentEvent::Moved,
            false,
        );

        self.records.store_document(&document).await?;

        let mut entry = audit.entry_for(&document, DocumentEvent::Moved);
        entry.previous_path = Some(previous_path);
        entry.path = self.records.folder_path(folder.id).await.ok();
        self.record_history(entry).await;

        self.ledger.persist_async(version);

        debug!(doc_id = %doc_id, folder_id = %folder.id, "Moved document");
        Ok(())
    }
}
