//! # docvault-database
//!
//! PostgreSQL implementations of the coordinator's record-store and
//! history-sink contracts, plus connection pool management and the
//! migration runner.

pub mod connection;
pub mod history;
pub mod record;

pub use connection::DatabasePool;
pub use history::PgHistorySink;
pub use record::PgRecordStore;
