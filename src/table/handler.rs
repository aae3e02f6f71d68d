//! Loading delimited text into a [`TableSz`].

use super::table::TableSz;
use crate::common::Result;
use crate::delimited::buffer::CellBuffer;
use crate::delimited::format::FormatDefinition;
use crate::delimited::reader::{ReadOptions, ReadSummary, read_slice, read_stream};
use crate::delimited::state::{CellAction, CellHandler};
use std::io::Read;
use tracing::warn;

/// Cell handler storing every cell into a table.
///
/// Cells the table rejects are counted and reading goes on.
pub struct TableSzHandler<'t> {
    table: &'t mut TableSz,
    row_offset: usize,
    failed: usize,
}

impl<'t> TableSzHandler<'t> {
    pub fn new(table: &'t mut TableSz) -> Self {
        Self {
            table,
            row_offset: 0,
            failed: 0,
        }
    }

    /// Store rows `row_offset` rows below where they were read.
    pub fn with_row_offset(mut self, row_offset: usize) -> Self {
        self.row_offset = row_offset;
        self
    }

    /// Cells that could not be stored so far.
    pub fn failed(&self) -> usize {
        self.failed
    }
}

impl CellHandler for TableSzHandler<'_> {
    fn handle_cell(&mut self, row: usize, column: usize, cell: &CellBuffer<'_>) -> CellAction {
        let row = row + self.row_offset;
        if !self.table.add_string(&cell.text(), row, column) {
            self.failed += 1;
            warn!(
                row,
                column,
                len = cell.raw_byte_count(),
                block_size = self.table.config().block_size,
                "cell does not fit a table block"
            );
        }
        CellAction::Continue
    }
}

/// Reads a stream into `table`. Returns the summary and the number of rejected cells.
pub fn read_into_table<R: Read>(
    reader: R,
    format: &FormatDefinition,
    options: &ReadOptions,
    table: &mut TableSz,
) -> Result<(ReadSummary, usize)> {
    let mut handler = TableSzHandler::new(table);
    let summary = read_stream(reader, format, options, &mut handler)?;
    Ok((summary, handler.failed()))
}

/// Reads an in-memory buffer into `table`. Returns the summary and the number of rejected cells.
pub fn read_slice_into_table(
    data: &[u8],
    format: &FormatDefinition,
    options: &ReadOptions,
    table: &mut TableSz,
) -> Result<(ReadSummary, usize)> {
    let mut handler = TableSzHandler::new(table);
    let summary = read_slice(data, format, options, &mut handler)?;
    Ok((summary, handler.failed()))
}
