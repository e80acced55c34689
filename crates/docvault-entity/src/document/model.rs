//! Document entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use docvault_core::types::id::{DocumentId, FolderId, TenantId, UserId};

use super::status::{IndexingState, STATUS_UNLOCKED};

/// Type recorded when a file name carries no usable extension.
pub const TYPE_UNKNOWN: &str = "unknown";

/// The mutable head of a logical document.
///
/// Exactly one of two shapes holds: a *regular* document whose content
/// fields are meaningful, or an *alias* whose `doc_ref` points at another
/// document and whose content fields merely mirror it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    /// Unique document identifier.
    pub id: DocumentId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// The folder containing this document.
    pub folder_id: FolderId,
    /// File name including extension.
    pub file_name: String,
    /// Lowercase extension, or `"unknown"`.
    pub file_type: String,
    /// Current version (dotted major.minor, e.g. "1.3").
    pub version: String,
    /// The version whose binary content is currently associated. May lag
    /// `version` when only metadata changed.
    pub file_version: String,
    /// Content size in bytes.
    pub file_size: i64,
    /// Content digest, cleared whenever new content is written.
    pub digest: Option<String>,
    /// Best-effort page count of the content.
    pub page_count: i32,
    /// Lifecycle status code (see [`super::status`]).
    pub status: i16,
    /// Holder of the current lock, present iff locked.
    pub lock_user_id: Option<UserId>,
    /// Display name of the lock holder.
    pub lock_user_name: Option<String>,
    /// When set, every write path except an administrative override is
    /// rejected.
    pub immutable: bool,
    /// Full-text indexing state.
    pub indexed: IndexingState,
    /// For aliases: the referenced document.
    pub doc_ref: Option<DocumentId>,
    /// For aliases: optional target-format hint (e.g. "pdf").
    pub doc_ref_type: Option<String>,
    /// Caller-assigned identifier, unique within the tenant.
    pub custom_id: Option<String>,
    /// Metadata template, if any.
    pub template_id: Option<Uuid>,
    /// Searchable tags.
    pub tags: Vec<String>,
    /// Locale the content is extracted under.
    pub locale: String,
    /// Who published the latest revision.
    pub publisher: Option<String>,
    /// Id of the publisher.
    pub publisher_id: Option<UserId>,
    /// Who created the document.
    pub creator: Option<String>,
    /// Id of the creator.
    pub creator_id: Option<UserId>,
    /// Free-text comment of the latest lifecycle operation.
    pub comment: Option<String>,
    /// Pending external-reference id (e.g. an online-editing session),
    /// cleared on unlock and checkin.
    pub ext_res_id: Option<String>,
    /// Derived flag: a stamp has been applied to the content.
    pub stamped: bool,
    /// Derived flag: the content carries a digital signature.
    pub signed: bool,
    /// Derived flag: OCR has processed the content.
    pub ocr_processed: bool,
    /// Derived flag: barcodes have been extracted from the content.
    pub barcode_processed: bool,
    /// Soft-delete marker.
    pub deleted: bool,
    /// When the document was created.
    pub created_at: DateTime<Utc>,
    /// When the document was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Build a blank document in the given folder. Versioning fields are
    /// assigned by the coordinator on create.
    pub fn new(tenant_id: TenantId, folder_id: FolderId, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            tenant_id,
            folder_id,
            file_type: extension_of(&file_name)
                .unwrap_or_else(|| TYPE_UNKNOWN.to_string()),
            file_name,
            version: String::new(),
            file_version: String::new(),
            file_size: 0,
            digest: None,
            page_count: 1,
            status: STATUS_UNLOCKED,
            lock_user_id: None,
            lock_user_name: None,
            immutable: false,
            indexed: IndexingState::ToIndex,
            doc_ref: None,
            doc_ref_type: None,
            custom_id: None,
            template_id: None,
            tags: Vec::new(),
            locale: "en".to_string(),
            publisher: None,
            publisher_id: None,
            creator: None,
            creator_id: None,
            comment: None,
            ext_res_id: None,
            stamped: false,
            signed: false,
            ocr_processed: false,
            barcode_processed: false,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when this document is an alias of another.
    pub fn is_alias(&self) -> bool {
        self.doc_ref.is_some()
    }

    /// True when the document is not locked in any way.
    pub fn is_unlocked(&self) -> bool {
        self.status == STATUS_UNLOCKED
    }

    /// Lowercase extension of the current file name, if any.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.file_name)
    }

    /// Short display label used in log and error messages.
    pub fn label(&self) -> String {
        format!("{} ({})", self.file_name, self.id)
    }

    /// Apply a metadata patch. Versioning, folder, and lock fields are
    /// never touched here; the coordinator controls those.
    pub fn apply_update(&mut self, update: &DocumentUpdate) {
        if let Some(name) = &update.file_name {
            if !name.is_empty() && *name != self.file_name {
                self.file_name = name.clone();
                self.file_type = self
                    .extension()
                    .unwrap_or_else(|| TYPE_UNKNOWN.to_string());
            }
        }
        if let Some(tags) = &update.tags {
            self.tags = tags.clone();
        }
        if update.template_id != self.template_id {
            // A template change invalidates template-driven processing.
            self.ocr_processed = false;
            self.barcode_processed = false;
            self.template_id = update.template_id;
        }
        if let Some(locale) = &update.locale {
            self.locale = locale.clone();
        }
        if let Some(custom_id) = &update.custom_id {
            self.custom_id = Some(custom_id.clone());
        }
    }
}

/// Metadata patch accepted by `update` and `checkin`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentUpdate {
    /// New file name.
    pub file_name: Option<String>,
    /// Replacement tag set.
    pub tags: Option<Vec<String>>,
    /// New metadata template.
    pub template_id: Option<Uuid>,
    /// New content locale.
    pub locale: Option<String>,
    /// New caller-assigned identifier.
    pub custom_id: Option<String>,
}

/// Lowercase extension of a file name, when one exists.
pub fn extension_of(file_name: &str) -> Option<String> {
    file_name
        .rsplit('.')
        .next()
        .filter(|ext| *ext != file_name && !ext.is_empty())
        .map(|ext| ext.to_lowercase())
}
