//! Collaborator contracts defined independently of the domain entities.
//!
//! The content store and parser traits live here because they speak in
//! identifiers and byte streams only. The record-store, index, history,
//! and listener contracts need the entity types and are therefore defined
//! next to their consumer in `docvault-lifecycle`.

pub mod content;
pub mod parser;
