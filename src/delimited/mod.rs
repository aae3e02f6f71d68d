//! Delimited text (CSV, TSV and relatives) reading and writing
//!
//! This module provides a configurable character-level reader for delimited
//! text and a writer for [`TableSz`](crate::table::TableSz).
//!
//! # Features
//!
//! - **Configurable characters**: separator, enclosing and end-of-line characters can be fixed, disabled or auto-detected
//! - **Encodings**: single-byte, UTF-8, UTF-16/32 and UCS-2/4 input, with BOM detection
//! - **Appender strategies**: raw code units, decoded text, zero-copy views or nothing at all
//! - **Barebones fast path**: `memchr`-driven cell splitting for formats without enclosing characters
//! - **Handler control**: skip the rest of a line or stop the read after any cell
//! - **Partitioned reads**: rayon-based chunked reads into a table (feature `parallel`)
//!
//! # Example
//!
//! ```rust
//! use delimtab::delimited::{FormatDefinition, ReadOptions, RowCollector, read_slice};
//!
//! let mut rows = RowCollector::new();
//! read_slice(b"a,b\n\"c,d\",e\n", &FormatDefinition::csv(), &ReadOptions::default(), &mut rows)?;
//! assert_eq!(rows.into_rows(), vec![vec!["a", "b"], vec!["c,d", "e"]]);
//! # Ok::<(), delimtab::Error>(())
//! ```

pub mod appender;
pub mod barebones;
pub mod buffer;
pub mod format;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod reader;
pub mod settings;
pub mod source;
pub mod state;
pub mod writer;

pub use appender::CharAppender;
pub use buffer::CellBuffer;
pub use format::{EndOfLineType, FormatChar, FormatDefinition, FormatFlags};
#[cfg(feature = "parallel")]
pub use parallel::read_parallel_into_table;
pub use reader::{DelimitedReader, ParserKind, ReadOptions, ReadSummary, read_path, read_slice, read_stream};
pub use settings::FormatSettings;
pub use source::{ByteSource, SliceSource, StreamSource};
pub use state::{CellAction, CellHandler, ReadState, RowCollector};
pub use writer::{EnclosementPolicy, write_table};
