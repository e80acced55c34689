//! Audit history sink contract.

use async_trait::async_trait;

use docvault_core::result::AppResult;
use docvault_entity::history::HistoryEntry;

/// Append-only audit sink, independent of the record store's transaction.
///
/// History is a side effect, never a precondition: the coordinator logs
/// and continues when an append fails.
#[async_trait]
pub trait HistorySink: Send + Sync + 'static {
    /// Append one history entry.
    async fn store(&self, entry: &HistoryEntry) -> AppResult<()>;
}
