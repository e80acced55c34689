//! Audit context carrying the acting user through lifecycle operations.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::UserId;
use docvault_entity::document::Document;
use docvault_entity::history::{DocumentEvent, HistoryEntry};

/// Reserved system actor used by retention jobs; bypasses the archive
/// permission check.
pub const SYSTEM_RETENTION_USER: &str = "_retention";

/// The user performing a lifecycle operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// The user's id.
    pub id: UserId,
    /// The user's name, recorded on locks, versions, and history.
    pub username: String,
    /// Whether the user is a member of the administrative group.
    pub admin: bool,
}

impl Actor {
    /// Create a regular (non-administrative) actor.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            admin: false,
        }
    }

    /// Create an administrative actor.
    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            admin: true,
        }
    }
}

/// Context passed into every lifecycle operation: who is acting, from
/// which session, and with what comment. Every operation derives its
/// history entries from this context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditContext {
    /// The acting user.
    pub actor: Actor,
    /// Session the action originated from, if any.
    pub session_id: Option<String>,
    /// Event override; operations that delegate (checkout → lock) use
    /// this to keep the outer event kind.
    pub event: Option<DocumentEvent>,
    /// Free-text comment recorded on versions and history entries.
    pub comment: Option<String>,
    /// Machine-readable reason recorded on history entries.
    pub reason: Option<String>,
}

impl AuditContext {
    /// Create a context for the given actor.
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            session_id: None,
            event: None,
            comment: None,
            reason: None,
        }
    }

    /// Attach a comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Derive a context for a nested operation: same actor and session,
    /// no inherited event override.
    pub fn child(&self) -> Self {
        Self {
            actor: self.actor.clone(),
            session_id: self.session_id.clone(),
            event: None,
            comment: self.comment.clone(),
            reason: None,
        }
    }

    /// Reject contexts without a usable actor before any mutation.
    pub fn validate(&self) -> AppResult<()> {
        if self.actor.username.trim().is_empty() {
            return Err(AppError::validation("Audit context actor cannot be empty"));
        }
        Ok(())
    }

    /// Build a history entry describing `event` on `document`.
    pub fn entry_for(&self, document: &Document, event: DocumentEvent) -> HistoryEntry {
        HistoryEntry {
            id: Uuid::new_v4(),
            tenant_id: document.tenant_id,
            doc_id: Some(document.id),
            folder_id: Some(document.folder_id),
            version: Some(document.version.clone()),
            file_version: Some(document.file_version.clone()),
            event: event.code().to_string(),
            comment: self.comment.clone(),
            reason: self.reason.clone(),
            file_name: Some(document.file_name.clone()),
            previous_file_name: None,
            path: None,
            previous_path: None,
            user_id: self.actor.id,
            username: self.actor.username.clone(),
            session_id: self.session_id.clone(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::types::id::{FolderId, TenantId};

    #[test]
    fn test_validate_rejects_blank_actor() {
        let audit = AuditContext::new(Actor::new("  "));
        assert!(audit.validate().is_err());
        assert!(AuditContext::new(Actor::new("marco")).validate().is_ok());
    }

    #[test]
    fn test_entry_for_snapshots_document_fields() {
        let mut doc = Document::new(TenantId::new(), FolderId::new(), "a.txt");
        doc.version = "1.2".to_string();
        doc.file_version = "1.1".to_string();
        let audit = AuditContext::new(Actor::new("marco")).with_comment("tidy up");

        let entry = audit.entry_for(&doc, DocumentEvent::Changed);
        assert_eq!(entry.doc_id, Some(doc.id));
        assert_eq!(entry.version.as_deref(), Some("1.2"));
        assert_eq!(entry.file_version.as_deref(), Some("1.1"));
        assert_eq!(entry.event, "changed");
        assert_eq!(entry.comment.as_deref(), Some("tidy up"));
    }
}
