//! One column of a [`TableSz`](super::TableSz).

use super::block::{Block, StrHandle};

/// Block storage plus a row index sorted by row.
#[derive(Debug, Default)]
pub struct Column {
    blocks: Vec<Block>,
    rows: Vec<(usize, StrHandle)>,
}

impl Column {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` at `row`.
    ///
    /// A new block of `max(block_size, len + 1)` bytes is started when the
    /// last one is full, or exactly `block_size` bytes when oversized
    /// strings are not allowed. Returns `false`, leaving the column
    /// untouched, when `value` cannot be stored.
    pub fn add(&mut self, value: &str, row: usize, block_size: usize, allow_oversized: bool) -> bool {
        let handle = if value.is_empty() {
            StrHandle::EMPTY
        } else {
            let needed = value.len() + 1;
            if !allow_oversized && needed > block_size {
                return false;
            }
            if !self.blocks.last().is_some_and(|block| block.fits(value.len())) {
                let capacity = if allow_oversized { block_size.max(needed) } else { block_size };
                self.blocks.push(Block::with_capacity(capacity));
            }
            let block = self.blocks.len() - 1;
            let Some(offset) = self.blocks[block].push(value) else {
                return false;
            };
            StrHandle {
                block,
                offset,
                len: value.len(),
            }
        };

        match self.search(row) {
            Ok(pos) => self.rows[pos].1 = handle,
            Err(pos) => self.rows.insert(pos, (row, handle)),
        }
        true
    }

    #[inline]
    fn search(&self, row: usize) -> Result<usize, usize> {
        self.rows.binary_search_by_key(&row, |&(r, _)| r)
    }

    /// Handle stored at `row`.
    pub fn handle(&self, row: usize) -> Option<StrHandle> {
        self.search(row).ok().map(|pos| self.rows[pos].1)
    }

    /// String behind `handle`.
    pub fn resolve(&self, handle: StrHandle) -> &str {
        if handle.is_empty() {
            return "";
        }
        self.blocks
            .get(handle.block)
            .and_then(|block| block.get(handle.offset, handle.len))
            .unwrap_or("")
    }

    pub fn get(&self, row: usize) -> Option<&str> {
        self.handle(row).map(|handle| self.resolve(handle))
    }

    /// Adds `count` to every row index at or after `pos`.
    pub fn insert_rows_at(&mut self, pos: usize, count: usize) {
        let start = self.search(pos).unwrap_or_else(|p| p);
        for entry in &mut self.rows[start..] {
            entry.0 += count;
        }
    }

    /// Drops rows `[pos, pos + count)` and shifts the following rows down.
    ///
    /// The dropped strings stay in their blocks.
    pub fn remove_rows(&mut self, pos: usize, count: usize) {
        let end_row = pos.saturating_add(count);
        let start = self.search(pos).unwrap_or_else(|p| p);
        let end = self.search(end_row).unwrap_or_else(|p| p);
        self.rows.drain(start..end);
        for entry in &mut self.rows[start..] {
            entry.0 -= count;
        }
    }

    /// Highest row index present.
    pub fn max_row(&self) -> Option<usize> {
        self.rows.last().map(|&(row, _)| row)
    }

    /// Number of stored cells, empty strings included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn non_empty_count(&self) -> usize {
        self.rows.iter().filter(|(_, handle)| !handle.is_empty()).count()
    }

    /// Block bytes in use, terminators included.
    pub fn storage_size(&self) -> usize {
        self.blocks.iter().map(Block::used).sum()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Rows and their strings in ascending row order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.rows.iter().map(|&(row, handle)| (row, self.resolve(handle)))
    }

    /// Row indices in ascending order.
    pub fn rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().map(|&(row, _)| row)
    }

    /// Applies a sequence of row swaps to `0..row_count`.
    pub fn apply_swaps(&mut self, swaps: &[(usize, usize)], row_count: usize) {
        if self.rows.is_empty() || swaps.is_empty() {
            return;
        }
        let mut dense: Vec<Option<StrHandle>> = vec![None; row_count];
        for &(row, handle) in &self.rows {
            if let Some(slot) = dense.get_mut(row) {
                *slot = Some(handle);
            }
        }
        for &(a, b) in swaps {
            dense.swap(a, b);
        }
        self.rows = dense
            .into_iter()
            .enumerate()
            .filter_map(|(row, handle)| handle.map(|handle| (row, handle)))
            .collect();
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.rows.clear();
    }

    pub fn shrink_to_fit(&mut self) {
        self.blocks.shrink_to_fit();
        self.rows.shrink_to_fit();
    }
}
