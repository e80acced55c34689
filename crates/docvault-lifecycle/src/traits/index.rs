//! Full-text index contract.

use async_trait::async_trait;

use docvault_core::result::AppResult;
use docvault_core::types::id::DocumentId;
use docvault_entity::document::Document;

/// The external full-text indexing engine, keyed by document id.
///
/// Ranking and storage internals are the engine's business; the
/// coordinator only adds, removes, and reads back extracted content.
#[async_trait]
pub trait FullTextIndex: Send + Sync + 'static {
    /// Add (or replace) the hit for a document.
    async fn add_hit(&self, document: &Document, content: &str) -> AppResult<()>;

    /// Remove the hit for a document. Removing a missing hit is a no-op.
    async fn delete_hit(&self, doc_id: DocumentId) -> AppResult<()>;

    /// Remove the hits for a batch of documents.
    async fn delete_hits(&self, doc_ids: &[DocumentId]) -> AppResult<()>;

    /// Extracted content of a document's hit, when present.
    async fn hit_content(&self, doc_id: DocumentId) -> AppResult<Option<String>>;
}
