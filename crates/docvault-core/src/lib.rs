//! # docvault-core
//!
//! Core crate for DocVault. Contains the collaborator traits consumed by
//! the lifecycle coordinator, configuration schemas, typed identifiers,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other DocVault crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
