//! Content store trait for the binary side of a document.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;
use crate::types::id::DocumentId;

/// A byte stream type used for reading stored content.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Content-addressable blob storage keyed by (document id, resource name).
///
/// A *resource* is one stored artifact of a document: the main file of a
/// given file version, or an ancillary artifact such as a conversion or a
/// thumbnail, named `"<fileVersion>-<suffix>"`. Implementations exist for
/// the tiered local filesystem store; the trait is defined here in
/// `docvault-core` and implemented in `docvault-storage`.
#[async_trait]
pub trait ContentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Write the bytes of a resource, replacing any previous content.
    async fn store(&self, doc_id: DocumentId, resource: &str, data: Bytes) -> AppResult<()>;

    /// Read a resource as a byte stream.
    async fn read(&self, doc_id: DocumentId, resource: &str) -> AppResult<ByteStream>;

    /// Read a resource fully into memory.
    async fn read_bytes(&self, doc_id: DocumentId, resource: &str) -> AppResult<Bytes>;

    /// Delete one resource, or every resource of the document when
    /// `resource` is `None`.
    async fn delete(&self, doc_id: DocumentId, resource: Option<&str>) -> AppResult<()>;

    /// List the resource names belonging to one file version of a document.
    async fn list_resources(
        &self,
        doc_id: DocumentId,
        file_version: &str,
    ) -> AppResult<Vec<String>>;

    /// Check whether a resource exists.
    async fn exists(&self, doc_id: DocumentId, resource: &str) -> AppResult<bool>;

    /// Move every resource of a document into the given storage tier.
    /// Returns the number of resources moved.
    async fn move_resources_to_tier(&self, doc_id: DocumentId, tier: i32) -> AppResult<u32>;

    /// Compute the resource name for a file version, optionally suffixed
    /// for ancillary artifacts.
    fn resource_name(&self, file_version: &str, suffix: Option<&str>) -> String {
        match suffix {
            Some(s) => format!("{file_version}-{s}"),
            None => file_version.to_string(),
        }
    }
}
