//! The coordinator itself: collaborator wiring, the coordinator-wide
//! critical section, and shared helpers. The lifecycle operations live in
//! sibling modules (`checkin`, `locking`, `update`, `alias`, `indexing`,
//! `destroy`, `tier`), each an `impl` block on [`LifecycleCoordinator`].

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{Mutex, watch};
use tracing::warn;

use docvault_core::config::lifecycle::LifecycleConfig;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::traits::content::ContentStore;
use docvault_core::traits::parser::{ContentParser, ParseRequest};
use docvault_core::types::id::{DocumentId, FolderId};
use docvault_entity::document::Document;
use docvault_entity::folder::Folder;
use docvault_entity::history::HistoryEntry;

use crate::ledger::VersionLedger;
use crate::traits::{AccessControl, FullTextIndex, HistorySink, LifecycleListener, RecordStore};

/// The Document Lifecycle Coordinator.
///
/// One instance serves many concurrent callers. Lifecycle-mutating
/// operations serialize on a single coordinator-wide mutex: the record
/// store session is not assumed safe for interleaved use, and the
/// read-modify-write spans here must not interleave for the same
/// document. The contract is deliberately shaped so this can later be
/// refined to per-document sharded locks without changing signatures.
pub struct LifecycleCoordinator {
    pub(crate) records: Arc<dyn RecordStore>,
    pub(crate) content: Arc<dyn ContentStore>,
    pub(crate) indexer: Arc<dyn FullTextIndex>,
    pub(crate) parser: Arc<dyn ContentParser>,
    pub(crate) history: Arc<dyn HistorySink>,
    pub(crate) access: Arc<dyn AccessControl>,
    pub(crate) listeners: Vec<Arc<dyn LifecycleListener>>,
    pub(crate) ledger: VersionLedger,
    pub(crate) config: LifecycleConfig,
    /// Coordinator-wide critical section.
    pub(crate) serial: Mutex<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl LifecycleCoordinator {
    /// Wire a coordinator to its collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        records: Arc<dyn RecordStore>,
        content: Arc<dyn ContentStore>,
        indexer: Arc<dyn FullTextIndex>,
        parser: Arc<dyn ContentParser>,
        history: Arc<dyn HistorySink>,
        access: Arc<dyn AccessControl>,
        config: LifecycleConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ledger = VersionLedger::new(
            Arc::clone(&records),
            Arc::clone(&content),
            Arc::clone(&history),
            config.clone(),
            shutdown_rx,
        );
        Self {
            records,
            content,
            indexer,
            parser,
            history,
            access,
            listeners: Vec::new(),
            ledger,
            config,
            serial: Mutex::new(()),
            shutdown_tx,
        }
    }

    /// Register a checkin listener. Listeners run in registration order.
    pub fn add_listener(&mut self, listener: Arc<dyn LifecycleListener>) {
        self.listeners.push(listener);
    }

    /// The version ledger.
    pub fn ledger(&self) -> &VersionLedger {
        &self.ledger
    }

    /// Cancel outstanding background version writes. Called on process
    /// shutdown; pending writes exit without completing.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Load a document or fail with an unexisting-reference error.
    pub(crate) async fn require_document(&self, id: DocumentId) -> AppResult<Document> {
        self.records
            .find_document(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Unexisting document {id}")))
    }

    /// Load a folder or fail with an unexisting-reference error.
    pub(crate) async fn require_folder(&self, id: FolderId) -> AppResult<Folder> {
        self.records
            .find_folder(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Unexisting folder {id}")))
    }

    /// Append a history entry; failures are logged, never propagated.
    pub(crate) async fn record_history(&self, entry: HistoryEntry) {
        if let Err(e) = self.history.store(&entry).await {
            warn!(event = %entry.event, error = %e, "Failed to append history entry");
        }
    }

    /// Enforce tenant-wide uniqueness of a caller-assigned identifier.
    pub(crate) async fn enforce_custom_id_unique(
        &self,
        document: &Document,
        custom_id: Option<&str>,
    ) -> AppResult<()> {
        if let Some(custom_id) = custom_id {
            if let Some(existing) = self
                .records
                .find_by_custom_id(custom_id, document.tenant_id)
                .await?
            {
                if existing.id != document.id {
                    return Err(AppError::conflict(format!(
                        "Duplicated custom identifier '{custom_id}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Best-effort page count of in-memory content; failure is logged.
    pub(crate) async fn count_pages_into(&self, document: &mut Document, data: &Bytes) {
        match self.parser.count_pages(data.clone(), &document.file_name).await {
            Ok(pages) => document.page_count = pages,
            Err(e) => {
                warn!(doc = %document.label(), error = %e, "Cannot count pages of document");
            }
        }
    }

    /// Count pages of the stored content; returns 1 when counting fails.
    pub async fn count_pages(&self, document: &Document) -> i32 {
        let resource = self.content.resource_name(&document.file_version, None);
        let counted = async {
            let data = self.content.read_bytes(document.id, &resource).await?;
            self.parser.count_pages(data, &document.file_name).await
        }
        .await;
        match counted {
            Ok(pages) => pages,
            Err(e) => {
                warn!(doc = %document.label(), error = %e, "Cannot count pages of document");
                1
            }
        }
    }

    pub(crate) fn parse_request_for(
        &self,
        document: &Document,
        file_version: &str,
    ) -> ParseRequest {
        ParseRequest {
            file_name: document.file_name.clone(),
            file_version: Some(file_version.to_string()),
            locale: document.locale.clone(),
            tenant: document.tenant_id.to_string(),
        }
    }
}
