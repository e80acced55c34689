//! Content parser trait.
//!
//! Parser selection (by filename extension) and the individual format
//! parsers are external; the coordinator only drives extraction through
//! this contract.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;
use crate::traits::content::ByteStream;

/// Parameters handed to the parser alongside the raw content.
#[derive(Debug, Clone)]
pub struct ParseRequest {
    /// File name including extension; drives parser selection.
    pub file_name: String,
    /// The file version being parsed, if not the current one.
    pub file_version: Option<String>,
    /// Locale the text should be extracted under.
    pub locale: String,
    /// Name of the tenant the document belongs to.
    pub tenant: String,
}

/// Extracts text and page counts from stored content.
#[async_trait]
pub trait ContentParser: Send + Sync + 'static {
    /// Extract the full text of the given content stream.
    async fn parse(&self, stream: ByteStream, request: &ParseRequest) -> AppResult<String>;

    /// Count the pages of the given content. Best effort; callers treat
    /// failures as non-fatal.
    async fn count_pages(&self, data: Bytes, file_name: &str) -> AppResult<i32>;
}
