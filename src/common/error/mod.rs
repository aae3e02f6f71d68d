//! Unified error types for delimtab.
//!
//! This module provides the single error type shared by the delimited-text
//! reader, the writer, format persistence and the parallel reader.

// Submodule declarations
pub mod types;

// Re-exports
pub use types::{Error, Result};
