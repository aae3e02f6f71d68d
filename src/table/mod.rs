//! Columnar, block-allocated string storage.
//!
//! [`TableSz`] keeps every column's strings in fixed-capacity [`Block`]s and
//! a row index sorted by row. Blocks are append-only, so strings already
//! stored never move while the table grows.
//!
//! ```
//! use delimtab::table::TableSz;
//!
//! let mut table = TableSz::new();
//! assert!(table.add_string("b", 1, 0));
//! assert!(table.add_string("a", 0, 0));
//! table.sort_by_column_default(0);
//! assert_eq!(table.get(0, 0), Some("a"));
//! ```

pub mod block;
pub mod column;
pub mod handler;
#[allow(clippy::module_inception)]
pub mod table;

pub use block::{Block, StrHandle};
pub use column::Column;
pub use handler::{TableSzHandler, read_into_table, read_slice_into_table};
pub use table::{TableConfig, TableSz};

#[cfg(test)]
mod tests;
