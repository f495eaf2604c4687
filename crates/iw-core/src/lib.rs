//! inkwell/crates/iw-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Inkwell:
//! models, error taxonomy, ports, listing queries, pagination, forms,
//! and mutation rules. No web framework or database driver in here.

pub mod error;
pub mod forms;
pub mod models;
pub mod mutation;
pub mod pagination;
pub mod query;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
