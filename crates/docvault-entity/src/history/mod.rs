//! Audit history entities.

pub mod event;
pub mod model;

pub use event::DocumentEvent;
pub use model::HistoryEntry;
