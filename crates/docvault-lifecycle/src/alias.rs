//! Alias (shortcut) creation, materialization, and copying.

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::DocumentId;
use docvault_entity::document::model::extension_of;
use docvault_entity::document::status::STATUS_UNLOCKED;
use docvault_entity::document::{Document, IndexingState};
use docvault_entity::folder::Folder;
use docvault_entity::history::DocumentEvent;

use crate::context::AuditContext;
use crate::coordinator::LifecycleCoordinator;
use crate::traits::Permission;

impl LifecycleCoordinator {
    /// Create an alias of `document` in `folder`.
    ///
    /// Aliases never nest: when `document` is itself an alias the new one
    /// points straight at the underlying concrete document, so every
    /// consumer may treat `doc_ref` as a single hop. An `alias_type`
    /// overrides the alias's extension (e.g. a "pdf" shortcut onto a
    /// native CAD file).
    pub async fn create_alias(
        &self,
        document: &Document,
        folder: &Folder,
        alias_type: Option<&str>,
        audit: &AuditContext,
    ) -> AppResult<Document> {
        audit.validate()?;

        let mut alias = Document::new(document.tenant_id, folder.id, document.file_name.clone());
        alias.file_size = document.file_size;
        alias.version = document.version.clone();
        alias.file_version = document.file_version.clone();
        alias.locale = document.locale.clone();
        alias.status = STATUS_UNLOCKED;
        alias.publisher = Some(audit.actor.username.clone());
        alias.publisher_id = Some(audit.actor.id);
        alias.creator = Some(audit.actor.username.clone());
        alias.creator_id = Some(audit.actor.id);

        if let Some(alias_type) = alias_type.filter(|t| !t.is_empty()) {
            let extension = extension_of(alias_type).unwrap_or_else(|| alias_type.to_lowercase());
            let base = document
                .file_name
                .rsplit_once('.')
                .map(|(base, _)| base)
                .unwrap_or(&document.file_name);
            alias.file_name = format!("{base}.{extension}");
            alias.file_type = extension;
        }

        alias.doc_ref = Some(document.doc_ref.unwrap_or(document.id));
        alias.doc_ref_type = alias_type.map(str::to_string);

        self.records.store_document(&alias).await?;
        self.record_history(audit.entry_for(&alias, DocumentEvent::ShortcutStored))
            .await;

        debug!(alias_id = %alias.id, doc_ref = ?alias.doc_ref, "Created alias");
        Ok(alias)
    }

    /// Materialize an alias: delete it and put a full copy of the
    /// underlying document (with its notes and links) in its place.
    pub async fn replace_alias(
        &self,
        alias_id: DocumentId,
        audit: &AuditContext,
    ) -> AppResult<Document> {
        audit.validate()?;

        let alias = self
            .records
            .find_document(alias_id)
            .await?
            .filter(Document::is_alias)
            .ok_or_else(|| AppError::not_found(format!("Unable to find alias {alias_id}")))?;
        let doc_ref = alias
            .doc_ref
            .ok_or_else(|| AppError::not_found(format!("Unable to find alias {alias_id}")))?;

        let folder = self.require_folder(alias.folder_id).await?;
        if !self
            .access
            .is_allowed(audit.actor.id, folder.id, Permission::Write)
            .await?
        {
            return Err(AppError::authorization(format!(
                "User {} without WRITE permission in folder {}",
                audit.actor.username, folder.id
            )));
        }

        let original = self.require_document(doc_ref).await?;

        self.records.soft_delete_document(alias_id).await?;

        self.copy_to_folder(&original, &folder, &audit.child(), true, true)
            .await
    }

    /// Copy a document into a folder as a new document.
    ///
    /// Copying an alias produces another alias of the same underlying
    /// document. The copy starts unlocked, with derived flags cleared and
    /// queued for indexing; links and notes follow on request.
    pub async fn copy_to_folder(
        &self,
        document: &Document,
        folder: &Folder,
        audit: &AuditContext,
        copy_links: bool,
        copy_notes: bool,
    ) -> AppResult<Document> {
        audit.validate()?;

        if document.is_alias() {
            return self
                .create_alias(document, folder, document.doc_ref_type.as_deref(), audit)
                .await;
        }

        let resource = self.content.resource_name(&document.file_version, None);
        let data = self.content.read_bytes(document.id, &resource).await?;

        let mut cloned = document.clone();
        cloned.id = DocumentId::new();
        cloned.folder_id = folder.id;
        cloned.created_at = Utc::now();
        cloned.updated_at = cloned.created_at;
        cloned.status = STATUS_UNLOCKED;
        cloned.lock_user_id = None;
        cloned.lock_user_name = None;
        // The custom id is unique per tenant and stays with the original.
        cloned.custom_id = None;
        if cloned.indexed == IndexingState::Indexed {
            cloned.indexed = IndexingState::ToIndex;
        }
        cloned.stamped = false;
        cloned.signed = false;
        cloned.ocr_processed = false;
        cloned.barcode_processed = false;

        let created = self.create(data, cloned, audit).await?;

        let path = self
            .records
            .folder_path(folder.id)
            .await
            .unwrap_or_default();
        let mut entry = audit.entry_for(document, DocumentEvent::Copied);
        entry.comment = Some(format!("{path}/{}", created.file_name));
        self.record_history(entry).await;

        if copy_links {
            for link in self.records.find_links(document.id).await? {
                let mut new_link = link.clone();
                new_link.id = Uuid::new_v4();
                if link.doc1 == document.id {
                    new_link.doc1 = created.id;
                } else {
                    new_link.doc2 = created.id;
                }
                if let Err(e) = self.records.store_link(&new_link).await {
                    warn!(link = %link.id, error = %e, "Error copying link");
                }
            }
        }

        if copy_notes {
            let mut notes = self
                .records
                .find_notes(document.id, Some(&document.file_version))
                .await?;
            notes.sort_by_key(|note| note.created_at);
            for note in notes {
                let mut new_note = note.clone();
                new_note.id = Uuid::new_v4();
                new_note.doc_id = created.id;
                new_note.file_version = None;
                if let Err(e) = self.records.store_note(&new_note).await {
                    warn!(note = %note.id, error = %e, "Error copying note");
                }
            }
        }

        Ok(created)
    }
}
