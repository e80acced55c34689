//! Document status and indexing-state codes.

use serde::{Deserialize, Serialize};

/// Document is not locked by anyone.
pub const STATUS_UNLOCKED: i16 = 0;
/// Document is checked out for exclusive editing.
pub const STATUS_CHECKED_OUT: i16 = 1;
/// Document is locked with a generic lock.
pub const STATUS_LOCKED: i16 = 2;
/// Document has been archived.
pub const STATUS_ARCHIVED: i16 = 3;

/// Human-readable label for a status code.
///
/// The status column is an open set: plugins may introduce their own lock
/// reasons above the well-known codes, which is why the column stays a
/// plain `i16` rather than a closed enum.
pub fn status_label(code: i16) -> &'static str {
    match code {
        STATUS_UNLOCKED => "unlocked",
        STATUS_CHECKED_OUT => "checked-out",
        STATUS_LOCKED => "locked",
        STATUS_ARCHIVED => "archived",
        _ => "custom-lock",
    }
}

/// Whether a document's content is present in, absent from, or deliberately
/// excluded from the full-text index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
pub enum IndexingState {
    /// The content changed and must be (re-)extracted and indexed.
    ToIndex = 0,
    /// The current content is present in the index.
    Indexed = 1,
    /// The document is deliberately excluded from the index.
    Skip = 2,
    /// Only the metadata should be re-submitted; content is unchanged.
    ToIndexMetadata = 3,
}

impl IndexingState {
    /// Numeric code as persisted in the record store.
    pub fn code(self) -> i16 {
        self as i16
    }

    /// True when this state requests an indexing pass.
    pub fn needs_indexing(self) -> bool {
        matches!(self, Self::ToIndex | Self::ToIndexMetadata)
    }
}
