//! Indexing orchestration: what to parse, what to reuse, and how the
//! durable indexing state is kept correct.

use std::time::Instant;

use tracing::{debug, error, warn};

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::id::DocumentId;
use docvault_entity::document::{Document, IndexingState};
use docvault_entity::history::DocumentEvent;

use crate::context::AuditContext;
use crate::coordinator::LifecycleCoordinator;

impl LifecycleCoordinator {
    /// Index one document, returning the content-extraction time in
    /// milliseconds (0 when extraction was skipped or reused).
    ///
    /// Aliases resolve to their referenced document first: a dangling
    /// alias is durably excluded (SKIP) rather than erroring, an alias of
    /// a document that itself needs indexing indexes that document first
    /// and reuses its extracted content instead of parsing twice.
    ///
    /// Whatever way this pass ends, every alias of the document is marked
    /// for re-indexing on the way out.
    pub async fn index(
        &self,
        doc_id: DocumentId,
        content: Option<String>,
        audit: &AuditContext,
    ) -> AppResult<u64> {
        let result = self.index_inner(doc_id, content, audit).await;

        if let Err(e) = self.records.mark_aliases_to_index(doc_id).await {
            warn!(doc_id = %doc_id, error = %e, "Failed to mark aliases for reindexing");
        }

        result
    }

    async fn index_inner(
        &self,
        doc_id: DocumentId,
        content: Option<String>,
        audit: &AuditContext,
    ) -> AppResult<u64> {
        let document = self.require_document(doc_id).await?;
        debug!(doc_id = %document.id, file_name = %document.file_name, "Indexing document");

        let previous_state = document.indexed;
        let mut text = content;
        let mut parsing_time_ms = 0u64;

        if let Some(ref_id) = document.doc_ref {
            match self.records.find_document(ref_id).await? {
                Some(referenced) => {
                    if referenced.indexed.needs_indexing() {
                        // Index the referenced document first.
                        parsing_time_ms =
                            Box::pin(self.index(referenced.id, text.clone(), &audit.child()))
                                .await?;
                    }
                    if text.as_deref().is_none_or(str::is_empty) {
                        // Reuse the already-extracted content to avoid
                        // parsing the same file twice.
                        text = self.indexer.hit_content(referenced.id).await?;
                    }
                }
                None => {
                    debug!(
                        alias = %document.label(),
                        doc_ref = %ref_id,
                        "Alias references an unexisting document and cannot be indexed"
                    );
                    self.records
                        .mark_indexed(document.id, IndexingState::Skip)
                        .await?;
                    return Ok(0);
                }
            }
        }

        let mut text = text.unwrap_or_default();
        if text.is_empty() && document.indexed != IndexingState::ToIndexMetadata {
            // Extraction may take very long; measure it.
            let started = Instant::now();
            text = match self.parse_document(&document, None).await {
                Ok(extracted) => extracted,
                Err(e) => {
                    self.record_indexing_error(audit, &document, &e).await;
                    return Err(e);
                }
            };
            parsing_time_ms = started.elapsed().as_millis() as u64;
        }

        if let Err(e) = self.indexer.add_hit(&document, &text).await {
            let e = AppError::with_source(
                ErrorKind::Parsing,
                format!("Cannot index document {}", document.label()),
                e,
            );
            self.record_indexing_error(audit, &document, &e).await;
            return Err(e);
        }

        // For additional safety update the persisted column directly: a
        // crash after add_hit must not leave the row marked to-index.
        self.records
            .mark_indexed(document.id, IndexingState::Indexed)
            .await?;

        let mut entry = audit.entry_for(&document, DocumentEvent::Indexed);
        entry.comment = Some(excerpt(&text, 100));
        entry.reason = Some(previous_state.code().to_string());
        self.record_history(entry).await;

        Ok(parsing_time_ms)
    }

    /// Extract the text of a document's stored content, resolving aliases
    /// to their referenced document first.
    pub async fn parse_document(
        &self,
        document: &Document,
        file_version: Option<&str>,
    ) -> AppResult<String> {
        let target = match document.doc_ref {
            Some(ref_id) => self
                .records
                .find_document(ref_id)
                .await?
                .ok_or_else(|| {
                    AppError::parsing(format!("Unexisting referenced document {ref_id}"))
                })?,
            None => document.clone(),
        };

        let file_version = file_version.unwrap_or(&target.file_version).to_string();
        let resource = self.content.resource_name(&file_version, None);
        let stream = self.content.read(target.id, &resource).await?;
        let request = self.parse_request_for(&target, &file_version);

        debug!(doc_id = %target.id, file_name = %target.file_name, "Parsing stored content");
        self.parser.parse(stream, &request).await.map_err(|e| {
            error!(doc = %target.label(), error = %e, "Cannot parse document");
            if e.kind == ErrorKind::Parsing {
                e
            } else {
                AppError::with_source(
                    ErrorKind::Parsing,
                    format!("Cannot parse document {}", target.label()),
                    e,
                )
            }
        })
    }

    /// Remove a document from the index and queue it (and its aliases)
    /// for re-indexing. Errors are logged, never surfaced.
    pub async fn delete_from_index(&self, document: &Document) {
        let outcome: AppResult<()> = async {
            self.indexer.delete_hit(document.id).await?;
            let mut updated = document.clone();
            updated.indexed = IndexingState::ToIndex;
            self.records.store_document(&updated).await?;
            self.records.mark_aliases_to_index(document.id).await?;
            Ok(())
        }
        .await;

        if let Err(e) = outcome {
            error!(doc_id = %document.id, error = %e, "Failed to remove document from the index");
        }
    }

    /// Change a document's indexing state. A no-op when the state is
    /// unchanged; leaving the indexed state drops the hit first.
    pub async fn change_indexing_status(&self, document: &mut Document, state: IndexingState) {
        if document.indexed == state {
            return;
        }
        if document.indexed == IndexingState::Indexed {
            self.delete_from_index(document).await;
        }
        document.indexed = state;
        if let Err(e) = self.records.store_document(document).await {
            error!(doc_id = %document.id, error = %e, "Failed to change indexing state");
        }
    }

    async fn record_indexing_error(
        &self,
        audit: &AuditContext,
        document: &Document,
        error: &AppError,
    ) {
        let mut entry = audit.entry_for(document, DocumentEvent::IndexedError);
        entry.comment = Some(error.message.clone());
        entry.path = self.records.folder_path(document.folder_id).await.ok();
        self.record_history(entry).await;

        if error.kind == ErrorKind::Parsing && self.config.index_skip_on_error {
            // Do not retry forever; durably exclude the document.
            if let Err(e) = self
                .records
                .mark_indexed(document.id, IndexingState::Skip)
                .await
            {
                error!(
                    doc_id = %document.id,
                    error = %e,
                    "Failed to exclude document from indexing"
                );
            }
        }
    }
}

/// First `max` characters of extracted content, with markup and control
/// characters stripped, for use in a history comment.
fn excerpt(content: &str, max: usize) -> String {
    let mut out = String::new();
    let mut count = 0usize;
    let mut in_tag = false;
    for ch in content.chars() {
        if count >= max {
            break;
        }
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if in_tag => {}
            c if c.is_control() || c.is_whitespace() => {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                    count += 1;
                }
            }
            c => {
                out.push(c);
                count += 1;
            }
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::excerpt;

    #[test]
    fn test_excerpt_strips_markup_and_truncates() {
        assert_eq!(excerpt("<p>Hello   <b>world</b></p>", 100), "Hello world");
        assert_eq!(excerpt("abcdef", 3), "abc");
        assert_eq!(excerpt("line\r\nbreaks\tand\ttabs", 100), "line breaks and tabs");
    }
}
