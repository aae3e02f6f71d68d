//! Columnar string table.

use super::block::StrHandle;
use super::column::Column;
use std::cmp::Ordering;

/// Configuration for [`TableSz`] storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    /// Nominal block capacity in bytes
    pub block_size: usize,
    /// Whether strings longer than a block get a block of their own
    pub allow_oversized_strings: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            block_size: 2048,               // 2KB blocks
            allow_oversized_strings: true, // Never reject a cell by default
        }
    }
}

impl TableConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the block capacity
    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    /// Allow/disallow strings that do not fit a block
    pub fn with_allow_oversized_strings(mut self, allow: bool) -> Self {
        self.allow_oversized_strings = allow;
        self
    }
}

/// Sparse table of strings stored column by column.
///
/// Strings live in append-only blocks owned by their column. Storing more
/// strings never moves a string already stored, so a `&str` obtained from
/// [`TableSz::get`] keeps pointing at the same bytes until its cell is
/// overwritten, removed or the table is cleared.
///
/// The table is not synchronized; share it behind a lock.
#[derive(Debug, Default)]
pub struct TableSz {
    columns: Vec<Column>,
    config: TableConfig,
}

impl TableSz {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TableConfig) -> Self {
        Self {
            columns: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Stores `value` at (`row`, `col`), replacing any previous value.
    ///
    /// Returns `false` when the value does not fit a block and oversized
    /// strings are not allowed; the table is then unchanged.
    pub fn add_string(&mut self, value: &str, row: usize, col: usize) -> bool {
        let TableConfig {
            block_size,
            allow_oversized_strings,
        } = self.config;
        if !value.is_empty() && !allow_oversized_strings && value.len() + 1 > block_size {
            return false;
        }
        if self.columns.len() <= col {
            self.columns.resize_with(col + 1, Column::new);
        }
        self.columns[col].add(value, row, block_size, allow_oversized_strings)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.columns.get(col)?.get(row)
    }

    /// Storage handle of a cell.
    pub fn handle(&self, row: usize, col: usize) -> Option<StrHandle> {
        self.columns.get(col)?.handle(row)
    }

    pub fn column(&self, col: usize) -> Option<&Column> {
        self.columns.get(col)
    }

    /// Shifts rows at or after `pos` down by `count`.
    pub fn insert_rows_at(&mut self, pos: usize, count: usize) {
        if count == 0 {
            return;
        }
        for column in &mut self.columns {
            column.insert_rows_at(pos, count);
        }
    }

    /// Removes rows `[pos, pos + count)` and shifts the following rows up.
    pub fn remove_rows(&mut self, pos: usize, count: usize) {
        if count == 0 {
            return;
        }
        for column in &mut self.columns {
            column.remove_rows(pos, count);
        }
    }

    /// Inserts `count` empty columns before column `pos`.
    pub fn insert_columns_at(&mut self, pos: usize, count: usize) {
        if pos >= self.columns.len() {
            return;
        }
        self.columns.splice(pos..pos, std::iter::repeat_with(Column::new).take(count));
    }

    /// Removes columns `[pos, pos + count)` together with their blocks.
    pub fn erase_columns_by_pos_and_count(&mut self, pos: usize, count: usize) {
        let len = self.columns.len();
        let start = pos.min(len);
        let end = pos.saturating_add(count).min(len);
        self.columns.drain(start..end);
    }

    /// One past the highest row index in any column.
    pub fn row_count_by_max_row_index(&self) -> usize {
        self.columns
            .iter()
            .filter_map(Column::max_row)
            .max()
            .map_or(0, |row| row + 1)
    }

    pub fn col_count(&self) -> usize {
        self.columns.len()
    }

    /// Cells holding a non-empty string.
    pub fn cell_count_non_empty(&self) -> usize {
        self.columns.iter().map(Column::non_empty_count).sum()
    }

    /// Block bytes in use across all columns, terminators included.
    pub fn content_storage_size(&self) -> usize {
        self.columns.iter().map(Column::storage_size).sum()
    }

    /// Calls `f` for every stored cell of `col` in ascending row order.
    pub fn for_each_row_in_column<F>(&self, col: usize, mut f: F)
    where
        F: FnMut(usize, &str),
    {
        if let Some(column) = self.columns.get(col) {
            for (row, value) in column.iter() {
                f(row, value);
            }
        }
    }

    /// Row indices present in any column, ascending.
    pub fn row_indices(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.columns.iter().flat_map(Column::rows).collect();
        rows.sort_unstable();
        rows.dedup();
        rows
    }

    /// Reorders all rows by the values of column `col`.
    ///
    /// Missing cells sort before present ones. The sort is not stable.
    pub fn sort_by_column<F>(&mut self, col: usize, mut cmp: F)
    where
        F: FnMut(Option<&str>, Option<&str>) -> Ordering,
    {
        let row_count = self.row_count_by_max_row_index();
        if row_count < 2 || col >= self.columns.len() {
            return;
        }

        let mut order: Vec<usize> = (0..row_count).collect();
        {
            let key = &self.columns[col];
            order.sort_unstable_by(|&a, &b| cmp(key.get(a), key.get(b)));
        }

        let swaps = swap_sequence(&order);
        for column in &mut self.columns {
            column.apply_swaps(&swaps, row_count);
        }
    }

    /// [`sort_by_column`](Self::sort_by_column) in lexicographic byte order.
    pub fn sort_by_column_default(&mut self, col: usize) {
        self.sort_by_column(col, |a, b| a.cmp(&b));
    }

    /// Copies every cell of `other` into this table, `row_offset` rows down.
    ///
    /// Returns the number of cells that could not be stored.
    pub fn append_rows_from(&mut self, other: &TableSz, row_offset: usize) -> usize {
        let mut failed = 0;
        for (col, column) in other.columns.iter().enumerate() {
            for (row, value) in column.iter() {
                if !self.add_string(value, row + row_offset, col) {
                    failed += 1;
                }
            }
        }
        failed
    }

    /// Drops all cells and blocks, keeping the column vector allocation.
    pub fn clear(&mut self) {
        self.columns.clear();
    }

    pub fn shrink_to_fit(&mut self) {
        for column in &mut self.columns {
            column.shrink_to_fit();
        }
        self.columns.shrink_to_fit();
    }
}

/// Decomposes a permutation into swaps.
///
/// `order[i]` is the current position of the element that must end up at
/// `i`. Applying the returned swaps in sequence performs the permutation.
fn swap_sequence(order: &[usize]) -> Vec<(usize, usize)> {
    let n = order.len();
    // at[p]: element currently at position p; pos[e]: position of element e
    let mut at: Vec<usize> = (0..n).collect();
    let mut pos: Vec<usize> = (0..n).collect();
    let mut swaps = Vec::new();

    for (i, &wanted) in order.iter().enumerate() {
        let j = pos[wanted];
        if j == i {
            continue;
        }
        swaps.push((i, j));
        let displaced = at[i];
        at.swap(i, j);
        pos[wanted] = i;
        pos[displaced] = j;
    }
    swaps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_sequence() {
        let order = [2, 0, 3, 1];
        let mut items = vec!['a', 'b', 'c', 'd'];
        for (a, b) in swap_sequence(&order) {
            items.swap(a, b);
        }
        assert_eq!(items, vec!['c', 'a', 'd', 'b']);
        assert!(swap_sequence(&[0, 1, 2]).is_empty());
    }
}
