//! Pre-mutation snapshot used for compensating rollback.
//!
//! There is no transaction spanning the record store and the content
//! store, so a checkin that fails at the content write cannot be rolled
//! back by the database. Instead the orchestrator captures this snapshot
//! before mutating anything and applies it back onto the document when
//! the content write fails.

use docvault_core::types::id::UserId;
use docvault_entity::document::{Document, IndexingState};
use uuid::Uuid;

/// The document fields restored by a failed checkin: the metadata
/// attributes, the processing flags, the indexing state, the custom id,
/// the lock status, and the comment. Versioning fields are deliberately
/// not captured; an interrupted checkin leaves its version-counter
/// advance behind.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    file_name: String,
    file_type: String,
    tags: Vec<String>,
    template_id: Option<Uuid>,
    locale: String,
    page_count: i32,
    custom_id: Option<String>,
    indexed: IndexingState,
    status: i16,
    lock_user_id: Option<UserId>,
    lock_user_name: Option<String>,
    stamped: bool,
    signed: bool,
    ocr_processed: bool,
    barcode_processed: bool,
    comment: Option<String>,
}

impl DocumentSnapshot {
    /// Capture the restorable fields of a document.
    pub fn capture(document: &Document) -> Self {
        Self {
            file_name: document.file_name.clone(),
            file_type: document.file_type.clone(),
            tags: document.tags.clone(),
            template_id: document.template_id,
            locale: document.locale.clone(),
            page_count: document.page_count,
            custom_id: document.custom_id.clone(),
            indexed: document.indexed,
            status: document.status,
            lock_user_id: document.lock_user_id,
            lock_user_name: document.lock_user_name.clone(),
            stamped: document.stamped,
            signed: document.signed,
            ocr_processed: document.ocr_processed,
            barcode_processed: document.barcode_processed,
            comment: document.comment.clone(),
        }
    }

    /// Apply the captured fields back onto the document.
    pub fn restore(&self, document: &mut Document) {
        document.file_name = self.file_name.clone();
        document.file_type = self.file_type.clone();
        document.tags = self.tags.clone();
        document.template_id = self.template_id;
        document.locale = self.locale.clone();
        document.page_count = self.page_count;
        document.custom_id = self.custom_id.clone();
        document.indexed = self.indexed;
        document.status = self.status;
        document.lock_user_id = self.lock_user_id;
        document.lock_user_name = self.lock_user_name.clone();
        document.stamped = self.stamped;
        document.signed = self.signed;
        document.ocr_processed = self.ocr_processed;
        document.barcode_processed = self.barcode_processed;
        document.comment = self.comment.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::types::id::{FolderId, TenantId};
    use docvault_entity::document::status::STATUS_CHECKED_OUT;

    #[test]
    fn test_restore_reverts_captured_fields() {
        let mut doc = Document::new(TenantId::new(), FolderId::new(), "draft.odt");
        doc.status = STATUS_CHECKED_OUT;
        doc.custom_id = Some("INV-17".to_string());
        doc.tags = vec!["draft".to_string()];
        doc.signed = true;

        let snapshot = DocumentSnapshot::capture(&doc);

        doc.file_name = "final.pdf".to_string();
        doc.file_type = "pdf".to_string();
        doc.status = 0;
        doc.custom_id = None;
        doc.tags.clear();
        doc.signed = false;
        doc.indexed = IndexingState::Indexed;
        doc.comment = Some("released".to_string());

        snapshot.restore(&mut doc);

        assert_eq!(doc.file_name, "draft.odt");
        assert_eq!(doc.file_type, "odt");
        assert_eq!(doc.status, STATUS_CHECKED_OUT);
        assert_eq!(doc.custom_id.as_deref(), Some("INV-17"));
        assert_eq!(doc.tags, vec!["draft".to_string()]);
        assert!(doc.signed);
        assert_eq!(doc.indexed, IndexingState::ToIndex);
        assert_eq!(doc.comment, None);
    }
}
