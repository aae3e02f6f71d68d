//! Delimtab - delimited text parsing into columnar string storage
//!
//! This library reads CSV-family text with a configurable character-level
//! state machine and stores the cells in a sparse, column-oriented string
//! table whose strings never move once stored.
//!
//! # Features
//!
//! - **Format definitions**: separator, enclosing and end-of-line characters, each fixed, disabled or auto-detected
//! - **Encodings**: Latin-1, Windows-1252, UTF-8, UTF-16, UTF-32, UCS-2 and UCS-4, with BOM detection
//! - **Two parsers**: a generic state machine and a zero-copy barebones path for simple formats
//! - **Columnar storage**: block-allocated [`TableSz`](table::TableSz) with row/column insertion, removal and sorting
//! - **Writing**: tables back to delimited text with configurable enclosing
//!
//! # Example - Reading into a table
//!
//! ```
//! use delimtab::delimited::{FormatDefinition, ReadOptions};
//! use delimtab::table::{TableSz, read_slice_into_table};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut table = TableSz::new();
//! let (summary, rejected) = read_slice_into_table(
//!     b"name,qty\n\"bolt, m4\",10\n",
//!     &FormatDefinition::csv(),
//!     &ReadOptions::default(),
//!     &mut table,
//! )?;
//!
//! assert_eq!(summary.rows, 2);
//! assert_eq!(rejected, 0);
//! assert_eq!(table.get(1, 0), Some("bolt, m4"));
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Handling cells as they are read
//!
//! ```
//! use delimtab::delimited::{CellAction, CellBuffer, FormatChar, FormatDefinition, ReadOptions, read_slice};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let format = FormatDefinition::csv().with_separator(FormatChar::Auto);
//! let mut first_column = Vec::new();
//! let summary = read_slice(b"a;b\nc;d\n", &format, &ReadOptions::default(), &mut |_row: usize, column: usize, cell: &CellBuffer<'_>| {
//!     first_column.push(cell.text().into_owned());
//!     if column == 0 { CellAction::SkipRestOfLine } else { CellAction::Continue }
//! })?;
//!
//! assert_eq!(summary.separator, FormatChar::Char(';'));
//! assert_eq!(first_column, vec!["a", "c"]);
//! # Ok(())
//! # }
//! ```

/// Shared infrastructure: errors, encodings and byte order marks
pub mod common;

/// Delimited text reader, writer and format definitions
pub mod delimited;

/// Columnar block-allocated string storage
pub mod table;

pub use common::{Error, Result, TextEncoding};
pub use delimited::{FormatDefinition, ReadOptions, read_path, read_slice, read_stream, write_table};
pub use table::{TableConfig, TableSz};
