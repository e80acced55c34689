//! Creation and the checkin flow, with its compensating rollback.

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, error, warn};

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::id::DocumentId;
use docvault_entity::document::model::TYPE_UNKNOWN;
use docvault_entity::document::status::STATUS_UNLOCKED;
use docvault_entity::document::{Document, DocumentUpdate, IndexingState};
use docvault_entity::history::DocumentEvent;

use crate::context::AuditContext;
use crate::coordinator::LifecycleCoordinator;
use crate::snapshot::DocumentSnapshot;
use crate::traits::SideChannel;

impl LifecycleCoordinator {
    /// Create a new document from content and a prepared record.
    ///
    /// The record is committed before the content write; when the content
    /// write fails the orphaned record is removed again and the failure
    /// surfaces. The initial version is handed to the async write path.
    pub async fn create(
        &self,
        content: Bytes,
        mut document: Document,
        audit: &AuditContext,
    ) -> AppResult<Document> {
        audit.validate()?;
        if content.is_empty() {
            return Err(AppError::validation("Cannot create a zero byte document"));
        }

        document.file_type = document
            .extension()
            .unwrap_or_else(|| TYPE_UNKNOWN.to_string());
        if document.publisher.is_none() {
            document.publisher = Some(audit.actor.username.clone());
            document.publisher_id = Some(audit.actor.id);
        }
        if document.creator.is_none() {
            document.creator = Some(audit.actor.username.clone());
            document.creator_id = Some(audit.actor.id);
        }
        document.status = STATUS_UNLOCKED;
        document.version = self.config.start_version.clone();
        document.file_version = document.version.clone();
        document.file_size = content.len() as i64;

        let _guard = self.serial.lock().await;

        self.count_pages_into(&mut document, &content).await;

        self.records.store_document(&document).await?;
        self.record_history(audit.entry_for(&document, DocumentEvent::Stored))
            .await;

        let resource = self.content.resource_name(&document.file_version, None);
        if let Err(e) = self.content.store(document.id, &resource, content).await {
            // The record is already visible; remove the orphan before
            // surfacing the storage failure.
            if let Err(delete_err) = self.records.soft_delete_document(document.id).await {
                error!(
                    doc_id = %document.id,
                    error = %delete_err,
                    "Failed to remove orphaned record after a store failure"
                );
            }
            return Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Unable to store the file of document {}", document.id),
                e,
            ));
        }

        let version = self.ledger.mint(
            &mut document,
            &audit.actor,
            audit.comment.as_deref(),
            DocumentEvent::Stored,
            true,
        );
        self.ledger.persist_async(version);

        debug!(doc_id = %document.id, "Created document");
        Ok(document)
    }

    /// Commit new content for a checked-out document as a new version and
    /// release the lock.
    pub async fn checkin(
        &self,
        doc_id: DocumentId,
        content: Bytes,
        file_name: &str,
        release: bool,
        metadata: Option<&DocumentUpdate>,
        audit: &AuditContext,
    ) -> AppResult<()> {
        audit.validate()?;
        if file_name.trim().is_empty() {
            return Err(AppError::validation("File name is mandatory"));
        }

        let _guard = self.serial.lock().await;

        let mut document = self.require_document(doc_id).await?;
        let previous_file_version = document.file_version.clone();

        if document.immutable && !audit.actor.admin {
            // Deliberate silent no-op. The sibling operations raise an
            // immutable error here; checkin historically does not, and
            // unifying them needs an explicit product decision first.
            debug!(doc_id = %doc_id, "Checkin on an immutable document ignored");
            return Ok(());
        }

        // Captured before any mutation: a failed content write restores
        // exactly what the caller saw.
        let snapshot = DocumentSnapshot::capture(&document);
        document.comment = audit.comment.clone();

        if let Some(metadata) = metadata {
            self.enforce_custom_id_unique(&document, metadata.custom_id.as_deref())
                .await?;

            // Apply the metadata while pinning the fields checkin owns.
            let folder_id = document.folder_id;
            let version = document.version.clone();
            let file_version = document.file_version.clone();
            document.apply_update(metadata);
            document.folder_id = folder_id;
            document.version = version;
            document.file_version = file_version;
        }
        // The explicit file name wins over the metadata patch.
        document.file_name = file_name.trim().to_string();
        document.file_type = document
            .extension()
            .unwrap_or_else(|| TYPE_UNKNOWN.to_string());

        self.count_pages_into(&mut document, &content).await;

        debug!("Invoking listeners before checkin");
        let mut side_channel = SideChannel::new();
        for listener in &self.listeners {
            listener
                .before_checkin(&mut document, audit, &mut side_channel)
                .await?;
        }

        // The new content invalidates everything derived from the old one.
        document.stamped = false;
        document.signed = false;
        document.ocr_processed = false;
        document.barcode_processed = false;
        if document.indexed != IndexingState::Skip {
            document.indexed = IndexingState::ToIndex;
        }

        // Interim commit; downstream steps reload from the record store.
        self.records.store_document(&document).await?;

        let mut document = self.require_document(doc_id).await?;
        document.updated_at = Utc::now();
        document.publisher = Some(audit.actor.username.clone());
        document.publisher_id = Some(audit.actor.id);
        document.status = STATUS_UNLOCKED;
        document.lock_user_id = None;
        document.lock_user_name = None;
        document.digest = None;
        document.ext_res_id = None;
        document.file_size = content.len() as i64;

        let mut version = self.ledger.mint(
            &mut document,
            &audit.actor,
            audit.comment.as_deref(),
            DocumentEvent::CheckedIn,
            release,
        );

        self.records.store_document(&document).await?;
        self.record_history(audit.entry_for(&document, DocumentEvent::CheckedIn))
            .await;

        let resource = self.content.resource_name(&document.file_version, None);
        if let Err(e) = self.content.store(document.id, &resource, content).await {
            // Compensating rollback: no transaction spans the two stores,
            // so the snapshot is applied field by field and re-persisted.
            snapshot.restore(&mut document);
            self.records.store_document(&document).await?;
            return Err(AppError::with_source(
                ErrorKind::Storage,
                format!(
                    "Cannot save the new version of document {} into the store",
                    document.label()
                ),
                e,
            ));
        }

        version.file_size = document.file_size;
        version.digest = None;
        self.ledger.persist_async(version);
        debug!(version = %document.version, "Stored version");

        debug!("Invoking listeners after checkin");
        for listener in &self.listeners {
            listener
                .after_checkin(&mut document, audit, &mut side_channel)
                .await?;
        }
        self.records.store_document(&document).await?;

        debug!(doc_id = %doc_id, "Checked in document");

        if document.file_version != previous_file_version {
            if let Err(e) = self
                .records
                .copy_annotations(doc_id, &previous_file_version, &document.file_version)
                .await
            {
                warn!(
                    doc_id = %doc_id,
                    error = %e,
                    "Cannot copy annotations onto the new file version"
                );
            }
        }

        Ok(())
    }

    /// Replace the stored content of an existing file version in place.
    ///
    /// Only applies to unlocked, mutable documents; anything else is
    /// ignored. Ancillary resources of that file version are dropped,
    /// affected version records get the new size via the async write
    /// path, and the document goes back to the indexing queue.
    pub async fn replace_file(
        &self,
        doc_id: DocumentId,
        file_version: &str,
        content: Bytes,
        audit: &AuditContext,
    ) -> AppResult<()> {
        audit.validate()?;

        let _guard = self.serial.lock().await;

        let mut document = self.require_document(doc_id).await?;
        if document.immutable || !document.is_unlocked() {
            debug!(doc = %document.label(), "Replace file ignored, document is locked or immutable");
            return Ok(());
        }

        let resource = self.content.resource_name(file_version, None);
        for ancillary in self
            .content
            .list_resources(doc_id, file_version)
            .await?
            .into_iter()
            .filter(|r| *r != resource)
        {
            self.content.delete(doc_id, Some(&ancillary)).await?;
        }

        let file_size = content.len() as i64;
        self.content.store(doc_id, &resource, content).await?;

        for mut version in self.records.find_versions_by_doc(doc_id).await? {
            if version.file_version == file_version {
                version.file_size = file_size;
                self.ledger.persist_async(version);
            }
        }

        document.file_size = file_size;
        if document.indexed != IndexingState::Skip {
            document.indexed = IndexingState::ToIndex;
        }
        document.stamped = false;
        document.signed = false;
        document.ocr_processed = false;
        document.barcode_processed = false;
        self.records.store_document(&document).await?;

        let mut entry = audit.entry_for(&document, DocumentEvent::VersionReplaced);
        entry.comment = Some(format!(
            "file version {file_version} - {}",
            audit.comment.clone().unwrap_or_default()
        ));
        self.record_history(entry).await;

        debug!(doc_id = %doc_id, file_version, "Replaced file version of document");
        Ok(())
    }

    /// Promote an old version: check the document out and commit the old
    /// version's content and metadata back as a new minor version.
    ///
    /// Only applies to unlocked, mutable documents; anything else is
    /// ignored.
    pub async fn promote_version(
        &self,
        doc_id: DocumentId,
        version: &str,
        audit: &AuditContext,
    ) -> AppResult<()> {
        audit.validate()?;

        let document = self.require_document(doc_id).await?;
        if document.immutable || !document.is_unlocked() {
            debug!(doc = %document.label(), "Promotion ignored, document is locked or immutable");
            return Ok(());
        }

        let promoted = self
            .records
            .find_version_by_spec(doc_id, version)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Unexisting version {version} of document {doc_id}"
                ))
            })?;

        self.checkout(doc_id, audit).await?;

        let resource = self.content.resource_name(&promoted.file_version, None);
        let data = self.content.read_bytes(doc_id, &resource).await?;

        let metadata = DocumentUpdate {
            file_name: Some(promoted.file_name.clone()),
            template_id: promoted.template_id,
            tags: promoted.tags.as_ref().map(|tags| {
                tags.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            }),
            custom_id: promoted.custom_id.clone(),
            locale: None,
        };

        let mut checkin_audit = audit.child();
        checkin_audit.comment = Some(format!("promoted version {version}"));
        self.checkin(
            doc_id,
            data,
            &promoted.file_name,
            false,
            Some(&metadata),
            &checkin_audit,
        )
        .await?;

        debug!(doc_id = %doc_id, version, "Promoted version of document");
        Ok(())
    }
}
