//! # docvault-storage
//!
//! Content store implementation for DocVault: a tiered local-filesystem
//! blob store keyed by (document id, resource name). Implements the
//! [`docvault_core::traits::content::ContentStore`] contract.

pub mod tiered;

pub use tiered::TieredContentStore;
