//! Record store contract: durable metadata persistence for documents,
//! versions, folders, and their satellite rows.

use async_trait::async_trait;

use docvault_core::result::AppResult;
use docvault_core::types::id::{DocumentId, FolderId, TenantId, VersionId};
use docvault_entity::document::{Document, DocumentLink, DocumentNote, IndexingState};
use docvault_entity::folder::Folder;
use docvault_entity::version::Version;

/// Durable metadata persistence.
///
/// Beyond entity CRUD this contract exposes the handful of *direct*
/// conditional updates the coordinator needs: the two-phase indexed-flag
/// write, the bulk alias re-index marking, archival, and the destroy
/// cascade purges. Those bypass the entity read-modify-write path on
/// purpose, so a crash between an in-memory mutation and its save still
/// leaves the durable state correct.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    // -- Documents --

    /// Find a non-deleted document by id.
    async fn find_document(&self, id: DocumentId) -> AppResult<Option<Document>>;

    /// Find a non-deleted document by its caller-assigned identifier
    /// within a tenant.
    async fn find_by_custom_id(
        &self,
        custom_id: &str,
        tenant_id: TenantId,
    ) -> AppResult<Option<Document>>;

    /// List the non-deleted documents of a folder.
    async fn find_documents_by_folder(&self, folder_id: FolderId) -> AppResult<Vec<Document>>;

    /// List the non-deleted aliases referencing a document.
    async fn find_aliases(&self, doc_ref: DocumentId) -> AppResult<Vec<Document>>;

    /// Write a document row (insert or update by id).
    async fn store_document(&self, document: &Document) -> AppResult<()>;

    /// Soft-delete a document. Returns `true` when a row was marked.
    async fn soft_delete_document(&self, id: DocumentId) -> AppResult<bool>;

    /// Existence check used by the background version writer while the
    /// owning document row may still be in flight.
    async fn document_exists(&self, id: DocumentId) -> AppResult<bool>;

    /// Directly set the persisted indexing state of one document,
    /// independent of any in-memory entity. Returns affected rows.
    async fn mark_indexed(&self, id: DocumentId, state: IndexingState) -> AppResult<u64>;

    /// Mark every alias of a document for re-indexing in one bulk
    /// conditional update. Returns affected rows.
    async fn mark_aliases_to_index(&self, doc_ref: DocumentId) -> AppResult<u64>;

    /// Directly set a document's status to archived. Archival is not a
    /// lock and bypasses the lock state machine.
    async fn archive_document(&self, id: DocumentId) -> AppResult<()>;

    // -- Folders --

    /// Find a folder by id.
    async fn find_folder(&self, id: FolderId) -> AppResult<Option<Folder>>;

    /// Ancestors of a folder, ordered from the immediate parent up to the
    /// root.
    async fn find_folder_parents(&self, id: FolderId) -> AppResult<Vec<Folder>>;

    /// Human-readable path of a folder (e.g. `/invoices/2026`).
    async fn folder_path(&self, id: FolderId) -> AppResult<String>;

    /// Every folder id in the tree rooted at `root`, including `root`.
    async fn find_folder_ids_in_tree(&self, root: FolderId) -> AppResult<Vec<FolderId>>;

    // -- Versions --

    /// Find a version by id (non-deleted).
    async fn find_version(&self, id: VersionId) -> AppResult<Option<Version>>;

    /// Find a document's version by its version string.
    async fn find_version_by_spec(
        &self,
        doc_id: DocumentId,
        version: &str,
    ) -> AppResult<Option<Version>>;

    /// Non-deleted versions of a document, newest first.
    async fn find_versions_by_doc(&self, doc_id: DocumentId) -> AppResult<Vec<Version>>;

    /// Write a version row (insert or update by id).
    async fn store_version(&self, version: &Version) -> AppResult<()>;

    /// Soft-delete a version. Returns `true` when a row was marked.
    async fn soft_delete_version(&self, id: VersionId) -> AppResult<bool>;

    // -- Notes and links --

    /// Notes of a document, optionally restricted to one file version.
    async fn find_notes(
        &self,
        doc_id: DocumentId,
        file_version: Option<&str>,
    ) -> AppResult<Vec<DocumentNote>>;

    /// Write a note row.
    async fn store_note(&self, note: &DocumentNote) -> AppResult<()>;

    /// Re-anchor the annotations of one file version onto another.
    /// Returns the number of annotations copied.
    async fn copy_annotations(
        &self,
        doc_id: DocumentId,
        from_file_version: &str,
        to_file_version: &str,
    ) -> AppResult<u64>;

    /// Links touching a document (either endpoint).
    async fn find_links(&self, doc_id: DocumentId) -> AppResult<Vec<DocumentLink>>;

    /// Write a link row.
    async fn store_link(&self, link: &DocumentLink) -> AppResult<()>;

    // -- Destroy cascade --
    //
    // Physical deletes, each returning the number of rows removed.
    // `purge_bookmarks` and `purge_tickets` may target tables that do not
    // exist in older schemas; implementations surface that as an error and
    // the coordinator continues the cascade.

    /// Physically delete all versions of a document.
    async fn purge_versions(&self, doc_id: DocumentId) -> AppResult<u64>;

    /// Physically delete all aliases referencing a document.
    async fn purge_aliases(&self, doc_id: DocumentId) -> AppResult<u64>;

    /// Physically delete all links touching a document.
    async fn purge_links(&self, doc_id: DocumentId) -> AppResult<u64>;

    /// Physically delete all notes of a document.
    async fn purge_notes(&self, doc_id: DocumentId) -> AppResult<u64>;

    /// Physically delete all bookmarks of a document.
    async fn purge_bookmarks(&self, doc_id: DocumentId) -> AppResult<u64>;

    /// Physically delete all download tickets of a document.
    async fn purge_tickets(&self, doc_id: DocumentId) -> AppResult<u64>;

    /// Physically delete the history of a document.
    async fn purge_history(&self, doc_id: DocumentId) -> AppResult<u64>;

    /// Physically delete the document row itself.
    async fn purge_document(&self, id: DocumentId) -> AppResult<u64>;
}
