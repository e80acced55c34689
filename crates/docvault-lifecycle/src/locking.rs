//! Lock state machine: lock, checkout, unlock, immutability, archival.

use tracing::{debug, info};

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::DocumentId;
use docvault_entity::document::status::{STATUS_ARCHIVED, STATUS_CHECKED_OUT, STATUS_UNLOCKED};
use docvault_entity::history::DocumentEvent;

use crate::context::{AuditContext, SYSTEM_RETENTION_USER};
use crate::coordinator::LifecycleCoordinator;
use crate::traits::Permission;

impl LifecycleCoordinator {
    /// Reserve a document for exclusive editing.
    pub async fn checkout(&self, doc_id: DocumentId, audit: &AuditContext) -> AppResult<()> {
        let mut audit = audit.clone();
        if audit.event.is_none() {
            audit.event = Some(DocumentEvent::CheckedOut);
        }
        self.lock(doc_id, STATUS_CHECKED_OUT, &audit).await
    }

    /// Lock a document with an arbitrary status code.
    ///
    /// Re-locking with the same status by the same actor is a no-op.
    /// Locking a document held by anyone else fails, naming the holder.
    pub async fn lock(&self, doc_id: DocumentId, status: i16, audit: &AuditContext) -> AppResult<()> {
        audit.validate()?;

        let _guard = self.serial.lock().await;

        let mut document = self.require_document(doc_id).await?;

        if document.status == status && document.lock_user_id == Some(audit.actor.id) {
            debug!(
                doc = %document.label(),
                user = %audit.actor.username,
                "Document is already locked by this user"
            );
            return Ok(());
        }

        if !document.is_unlocked() {
            let holder = document
                .lock_user_name
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            return Err(AppError::conflict(format!(
                "Document {} is already locked by user {} and cannot be locked by {}",
                document.label(),
                holder,
                audit.actor.username
            )));
        }

        document.lock_user_id = Some(audit.actor.id);
        document.lock_user_name = Some(audit.actor.username.clone());
        document.status = status;
        self.records.store_document(&document).await?;

        let event = audit.event.unwrap_or(DocumentEvent::Locked);
        self.record_history(audit.entry_for(&document, event)).await;

        debug!(doc_id = %doc_id, "Locked document");
        Ok(())
    }

    /// Release a lock.
    ///
    /// Administrators force the unlock regardless of the holder and
    /// additionally clear the immutable flag. Non-administrators may only
    /// release their own lock; unlocking an unlocked document succeeds.
    pub async fn unlock(&self, doc_id: DocumentId, audit: &AuditContext) -> AppResult<()> {
        audit.validate()?;

        let _guard = self.serial.lock().await;

        let mut document = self.require_document(doc_id).await?;

        if audit.actor.admin {
            document.immutable = false;
        } else if document.lock_user_id.is_none() || document.is_unlocked() {
            debug!(doc = %document.label(), "Document is already unlocked");
            return Ok(());
        } else if document.lock_user_id != Some(audit.actor.id) {
            let holder = document
                .lock_user_name
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            return Err(AppError::conflict(format!(
                "Document {} is locked by {} and cannot be unlocked by {}",
                document.label(),
                holder,
                audit.actor.username
            )));
        }

        document.lock_user_id = None;
        document.lock_user_name = None;
        document.ext_res_id = None;
        document.status = STATUS_UNLOCKED;
        self.records.store_document(&document).await?;
        self.record_history(audit.entry_for(&document, DocumentEvent::Unlocked))
            .await;

        debug!(doc_id = %doc_id, "Unlocked document");
        Ok(())
    }

    /// Permanently block mutation of a document. Fails when the document
    /// is already immutable.
    pub async fn make_immutable(&self, doc_id: DocumentId, audit: &AuditContext) -> AppResult<()> {
        audit.validate()?;

        let mut document = self.require_document(doc_id).await?;
        if document.immutable {
            return Err(AppError::immutable(format!(
                "Document {} is immutable",
                document.label()
            )));
        }

        document.immutable = true;
        self.records.store_document(&document).await?;
        self.record_history(audit.entry_for(&document, DocumentEvent::Immutable))
            .await;

        debug!(doc_id = %doc_id, "Document has been marked as immutable");
        Ok(())
    }

    /// Archive a batch of documents, returning the ids actually archived.
    ///
    /// Documents in folders the actor lacks the archive permission for are
    /// skipped; administrators and the reserved retention actor bypass the
    /// check. Archival is not a lock: the status is written directly and
    /// the index hits are removed in one batched call after the loop.
    pub async fn archive_documents(
        &self,
        doc_ids: &[DocumentId],
        audit: &AuditContext,
    ) -> AppResult<Vec<DocumentId>> {
        audit.validate()?;

        let bypass = audit.actor.admin || audit.actor.username == SYSTEM_RETENTION_USER;
        let mut archived = Vec::new();

        for &doc_id in doc_ids {
            let document = self.require_document(doc_id).await?;
            if document.status == STATUS_ARCHIVED {
                continue;
            }
            if !bypass
                && !self
                    .access
                    .is_allowed(audit.actor.id, document.folder_id, Permission::Archive)
                    .await?
            {
                continue;
            }

            self.records.archive_document(doc_id).await?;
            self.record_history(audit.entry_for(&document, DocumentEvent::Archived))
                .await;
            archived.push(doc_id);
        }

        self.indexer.delete_hits(&archived).await?;

        info!(count = archived.len(), "Archived documents");
        Ok(archived)
    }
}
