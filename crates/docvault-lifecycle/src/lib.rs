//! # docvault-lifecycle
//!
//! The Document Lifecycle Coordinator: governs how a versioned,
//! content-addressed document moves through creation, checkout/checkin,
//! locking, renaming, moving, aliasing, archival, and re-indexing, while
//! keeping the record store, the content store, and the full-text index
//! consistent without a transaction spanning all three.
//!
//! The coordinator is store-generic: it talks to its collaborators only
//! through the traits in [`traits`] and
//! [`docvault_core::traits`]. Production wiring lives in
//! `docvault-database` (record store, history sink) and
//! `docvault-storage` (content store).

pub mod context;
pub mod coordinator;
pub mod ledger;
pub mod snapshot;
pub mod traits;

mod alias;
mod checkin;
mod destroy;
mod indexing;
mod locking;
mod tier;
mod update;

pub use context::{Actor, AuditContext};
pub use coordinator::LifecycleCoordinator;
pub use ledger::VersionLedger;
