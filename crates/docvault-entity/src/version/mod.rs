//! Version domain entities.

pub mod model;

pub use model::{Version, next_version};
