//! The version ledger: minting, numbering, the asynchronous repair write
//! path, and version deletion.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use docvault_core::config::lifecycle::LifecycleConfig;
use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::traits::content::ContentStore;
use docvault_core::types::id::VersionId;
use docvault_entity::document::Document;
use docvault_entity::history::DocumentEvent;
use docvault_entity::version::{Version, next_version};

use crate::context::{Actor, AuditContext};
use crate::traits::{HistorySink, RecordStore};

/// Owns version creation, numbering, and the async-repair write path.
pub struct VersionLedger {
    records: Arc<dyn RecordStore>,
    content: Arc<dyn ContentStore>,
    history: Arc<dyn HistorySink>,
    config: LifecycleConfig,
    shutdown: watch::Receiver<bool>,
}

impl VersionLedger {
    pub(crate) fn new(
        records: Arc<dyn RecordStore>,
        content: Arc<dyn ContentStore>,
        history: Arc<dyn HistorySink>,
        config: LifecycleConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            records,
            content,
            history,
            config,
            shutdown,
        }
    }

    /// Mint a new in-memory version for `document` and advance the
    /// document's version fields according to the event:
    ///
    /// - `Stored` keeps the start version and associates the content;
    /// - `CheckedIn` bumps (major when `release`) and moves the file
    ///   version along, since new content was committed;
    /// - every other event bumps the minor component only, leaving the
    ///   file version on the content it already points at.
    ///
    /// The returned version is not yet durable; hand it to
    /// [`VersionLedger::persist_async`] or the record store.
    pub fn mint(
        &self,
        document: &mut Document,
        actor: &Actor,
        comment: Option<&str>,
        event: DocumentEvent,
        release: bool,
    ) -> Version {
        match event {
            DocumentEvent::Stored => {
                if document.version.is_empty() {
                    document.version = self.config.start_version.clone();
                }
                document.file_version = document.version.clone();
            }
            DocumentEvent::CheckedIn => {
                let next = next_version(&document.version, release);
                document.version = next.clone();
                document.file_version = next;
            }
            _ => {
                document.version = next_version(&document.version, false);
            }
        }

        Version {
            id: VersionId::new(),
            doc_id: document.id,
            version: document.version.clone(),
            file_version: document.file_version.clone(),
            file_size: document.file_size,
            digest: document.digest.clone(),
            event: event.code().to_string(),
            comment: comment.map(str::to_string),
            file_name: document.file_name.clone(),
            template_id: document.template_id,
            tags: (!document.tags.is_empty()).then(|| document.tags.join(",")),
            custom_id: document.custom_id.clone(),
            user_id: actor.id,
            username: actor.username.clone(),
            deleted: false,
            created_at: Utc::now(),
        }
    }

    /// Durably persist a version on a background task, waiting for the
    /// owning document row to become visible in the record store.
    ///
    /// The document row the version references may be written by a
    /// separate, not-yet-committed operation, so this does not write
    /// immediately: it polls for the row's existence on a fixed cadence
    /// with a bounded attempt budget (the consistency window), writes once
    /// on the first successful check, and logs and abandons the write when
    /// the budget runs out. The caller has already returned success at
    /// that point; abandonment is operator-visible only.
    ///
    /// The task observes the coordinator's shutdown channel between polls
    /// and exits without writing when the process is going down.
    pub fn persist_async(&self, version: Version) -> JoinHandle<()> {
        let records = Arc::clone(&self.records);
        let mut shutdown = self.shutdown.clone();
        let attempts = self.config.version_write_max_attempts;
        let interval = Duration::from_millis(self.config.version_write_interval_ms);

        tokio::spawn(async move {
            for _ in 0..attempts {
                if *shutdown.borrow() {
                    debug!(doc_id = %version.doc_id, "Shutting down, dropping pending version write");
                    return;
                }
                match records.document_exists(version.doc_id).await {
                    Ok(true) => {
                        debug!(doc_id = %version.doc_id, "Record of document has been written");
                        match records.store_version(&version).await {
                            Ok(()) => {
                                debug!(
                                    version = %version.version,
                                    doc_id = %version.doc_id,
                                    "Stored version of document"
                                );
                            }
                            Err(e) => {
                                error!(
                                    version = %version.version,
                                    doc_id = %version.doc_id,
                                    error = %e,
                                    "Failed to store version"
                                );
                            }
                        }
                        return;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        error!(
                            doc_id = %version.doc_id,
                            error = %e,
                            "Existence check failed, dropping pending version write"
                        );
                        return;
                    }
                }
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            debug!(doc_id = %version.doc_id, "Shutting down, dropping pending version write");
                            return;
                        }
                    }
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            error!(
                version = %version.version,
                doc_id = %version.doc_id,
                attempts,
                "Abandoning version write, the document record never appeared"
            );
        })
    }

    /// Delete a version.
    ///
    /// Deleting the only version of a document is refused: the sole
    /// version is returned unchanged. Otherwise the version is
    /// soft-deleted; its content resources are removed first when no
    /// other live version references the same file version. When the
    /// deleted version was the document's current one, the document is
    /// downgraded to the most recent remaining version.
    pub async fn delete_version(
        &self,
        version_id: VersionId,
        audit: &AuditContext,
    ) -> AppResult<Version> {
        audit.validate()?;

        let victim = self
            .records
            .find_version(version_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Unexisting version {version_id}")))?;
        let mut document = self
            .records
            .find_document(victim.doc_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Unexisting referenced document {}", victim.doc_id))
            })?;

        let versions = self.records.find_versions_by_doc(victim.doc_id).await?;
        if let [only] = versions.as_slice() {
            return Ok(only.clone());
        }

        let referenced = versions
            .iter()
            .any(|v| v.id != victim.id && v.file_version == victim.file_version);
        if referenced {
            warn!(
                version = %victim.version,
                file_version = %victim.file_version,
                doc_id = %victim.doc_id,
                "File version is still referenced, keeping its content"
            );
        } else {
            for resource in self
                .content
                .list_resources(victim.doc_id, &victim.file_version)
                .await?
            {
                if let Err(e) = self.content.delete(victim.doc_id, Some(&resource)).await {
                    warn!(
                        resource,
                        doc_id = %victim.doc_id,
                        error = %e,
                        "Unable to delete resource of document"
                    );
                }
            }
        }

        self.records
            .soft_delete_version(version_id)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    "Version not deleted from the record store",
                    e,
                )
            })?;

        let mut entry = audit.entry_for(&document, DocumentEvent::VersionDeleted);
        entry.comment = Some(format!("{} - {}", victim.version, victim.file_version));
        if let Err(e) = self.history.store(&entry).await {
            warn!(error = %e, "Failed to append history entry");
        }

        let remaining = self.records.find_versions_by_doc(victim.doc_id).await?;
        let last = remaining.first().cloned().ok_or_else(|| {
            AppError::internal(format!("No versions left for document {}", victim.doc_id))
        })?;

        if document.version == victim.version {
            document.version = last.version.clone();
            document.file_version = last.file_version.clone();
            self.records.store_document(&document).await?;

            let mut entry = audit.entry_for(&document, DocumentEvent::Changed);
            entry.comment = Some(format!(
                "Version changed to {} ({})",
                document.version, document.file_version
            ));
            if let Err(e) = self.history.store(&entry).await {
                warn!(error = %e, "Failed to append history entry");
            }
        }

        Ok(last)
    }
}
