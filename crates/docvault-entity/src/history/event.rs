//! Lifecycle event kinds recorded in the audit history.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of lifecycle event that produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentEvent {
    /// Initial storage of a new document.
    Stored,
    /// Metadata changed.
    Changed,
    /// New content committed via checkin.
    CheckedIn,
    /// Document reserved for exclusive editing.
    CheckedOut,
    /// Generic lock acquired.
    Locked,
    /// Lock released.
    Unlocked,
    /// Document marked immutable.
    Immutable,
    /// File name changed.
    Renamed,
    /// Document moved to another folder.
    Moved,
    /// Document copied to another folder.
    Copied,
    /// Content submitted to the full-text index.
    Indexed,
    /// Content extraction or index submission failed.
    IndexedError,
    /// A version was deleted.
    VersionDeleted,
    /// The content of an existing file version was replaced.
    VersionReplaced,
    /// An old version was promoted to become the current one.
    VersionPromoted,
    /// An alias (shortcut) was stored.
    ShortcutStored,
    /// Document archived.
    Archived,
    /// Document physically destroyed.
    Destroyed,
}

impl DocumentEvent {
    /// Stable code persisted in history rows and version records.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Changed => "changed",
            Self::CheckedIn => "checkedin",
            Self::CheckedOut => "checkedout",
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Immutable => "immutable",
            Self::Renamed => "renamed",
            Self::Moved => "moved",
            Self::Copied => "copied",
            Self::Indexed => "indexed",
            Self::IndexedError => "indexed_error",
            Self::VersionDeleted => "version_deleted",
            Self::VersionReplaced => "version_replaced",
            Self::VersionPromoted => "version_promoted",
            Self::ShortcutStored => "shortcut_stored",
            Self::Archived => "archived",
            Self::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for DocumentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DocumentEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stored" => Ok(Self::Stored),
            "changed" => Ok(Self::Changed),
            "checkedin" => Ok(Self::CheckedIn),
            "checkedout" => Ok(Self::CheckedOut),
            "locked" => Ok(Self::Locked),
            "unlocked" => Ok(Self::Unlocked),
            "immutable" => Ok(Self::Immutable),
            "renamed" => Ok(Self::Renamed),
            "moved" => Ok(Self::Moved),
            "copied" => Ok(Self::Copied),
            "indexed" => Ok(Self::Indexed),
            "indexed_error" => Ok(Self::IndexedError),
            "version_deleted" => Ok(Self::VersionDeleted),
            "version_replaced" => Ok(Self::VersionReplaced),
            "version_promoted" => Ok(Self::VersionPromoted),
            "shortcut_stored" => Ok(Self::ShortcutStored),
            "archived" => Ok(Self::Archived),
            "destroyed" => Ok(Self::Destroyed),
            other => Err(format!("unknown document event '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for event in [
            DocumentEvent::Stored,
            DocumentEvent::CheckedIn,
            DocumentEvent::IndexedError,
            DocumentEvent::ShortcutStored,
            DocumentEvent::Destroyed,
        ] {
            assert_eq!(event.code().parse::<DocumentEvent>().unwrap(), event);
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!("sprouted".parse::<DocumentEvent>().is_err());
    }
}
