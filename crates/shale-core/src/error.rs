//! Error types for the core engine.
//!
//! Everything in this crate is a deterministic computation over immutable
//! inputs, so errors are reported once at the call boundary and never
//! retried.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the core engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An ordering request named a table the dependency graph does not
    /// contain.
    #[error("Unknown table in requested set: {name}")]
    UnknownTable {
        /// The unrecognized table name.
        name: String,
    },

    /// The requested tables reference each other in a cycle (self-references
    /// excluded), so no insert order exists.
    #[error("Circular foreign-key dependency between tables: {}", tables.join(", "))]
    CircularDependency {
        /// Every table caught in the residual cycle, alphabetically.
        tables: Vec<String>,
    },
}
