//! Version entity model and the version-numbering rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::id::{DocumentId, UserId, VersionId};

/// An immutable-after-creation snapshot of a document in its version chain.
///
/// The chain for one document is totally ordered by creation time. A
/// version is never updated after it is written, except for the
/// soft-delete marker set by explicit version deletion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Version {
    /// Unique version identifier.
    pub id: VersionId,
    /// Owning document. The document row must exist in the record store
    /// before the version is durably written.
    pub doc_id: DocumentId,
    /// Version string at snapshot time (dotted major.minor).
    pub version: String,
    /// File version string at snapshot time.
    pub file_version: String,
    /// Content size in bytes.
    pub file_size: i64,
    /// Content digest, if computed.
    pub digest: Option<String>,
    /// The lifecycle event that minted this version (history event code).
    pub event: String,
    /// Free-text comment of the minting operation.
    pub comment: Option<String>,
    /// Denormalized file name at snapshot time.
    pub file_name: String,
    /// Denormalized template at snapshot time.
    pub template_id: Option<uuid::Uuid>,
    /// Denormalized tags at snapshot time, comma-joined.
    pub tags: Option<String>,
    /// Denormalized caller-assigned identifier at snapshot time.
    pub custom_id: Option<String>,
    /// Who triggered the minting operation.
    pub user_id: UserId,
    /// Display name of the actor.
    pub username: String,
    /// Soft-delete marker.
    pub deleted: bool,
    /// When the version was minted.
    pub created_at: DateTime<Utc>,
}

/// Compute the next version string.
///
/// A minor bump increments the component after the dot; a major release
/// bumps the integer part and resets the minor part to 0. Malformed
/// components are treated as 0 rather than failing the operation.
pub fn next_version(current: &str, release_major: bool) -> String {
    let (major, minor) = match current.split_once('.') {
        Some((maj, min)) => (
            maj.parse::<u64>().unwrap_or(0),
            min.parse::<u64>().unwrap_or(0),
        ),
        None => (current.parse::<u64>().unwrap_or(0), 0),
    };
    if release_major {
        format!("{}.0", major + 1)
    } else {
        format!("{major}.{}", minor + 1)
    }
}
