//! Common types and utilities shared by the reader, the writer and the table.

// Submodule declarations
pub mod bom;
pub mod encoding;
pub mod error;

// Re-exports for convenience
pub use bom::{BomKind, detect_bom, write_bom};
pub use encoding::TextEncoding;
pub use error::{Error, Result};
