//! Reader states and the cell handler contract.

use super::buffer::CellBuffer;

/// Where the reader is within the current cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadState {
    /// Nothing kept yet for the current cell
    LookingForData,
    /// Inside a cell that did not start with the enclosing character
    NakedCell,
    /// Inside an enclosed cell, before its closing enclosing character
    InEnclosedCell,
    /// After the closing enclosing character, before the next separator/eol
    PastEnclosedCell,
    /// The cell ended with a separator
    SeparatorSeen,
    /// The cell ended with an end of line
    EolSeen,
    /// The input is exhausted
    EndOfStream,
    /// The handler stopped the read
    Terminated,
}

impl ReadState {
    /// Whether the current cell is complete.
    #[inline]
    pub const fn is_cell_end(self) -> bool {
        matches!(
            self,
            ReadState::SeparatorSeen | ReadState::EolSeen | ReadState::EndOfStream | ReadState::Terminated
        )
    }

    /// Whether nothing more will be read.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, ReadState::EndOfStream | ReadState::Terminated)
    }
}

/// Handler verdict after each cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellAction {
    /// Keep reading
    #[default]
    Continue,
    /// Skip the remaining cells of the current line
    SkipRestOfLine,
    /// Stop reading immediately
    Terminate,
    /// Skip the remaining cells of the current line, then stop
    SkipAndTerminate,
}

impl CellAction {
    #[inline]
    pub const fn skips_line(self) -> bool {
        matches!(self, CellAction::SkipRestOfLine | CellAction::SkipAndTerminate)
    }

    #[inline]
    pub const fn terminates(self) -> bool {
        matches!(self, CellAction::Terminate | CellAction::SkipAndTerminate)
    }
}

/// Receiver of completed cells.
///
/// Closures taking `(row, column, &CellBuffer)` and returning a
/// [`CellAction`] implement this trait.
pub trait CellHandler {
    fn handle_cell(&mut self, row: usize, column: usize, cell: &CellBuffer<'_>) -> CellAction;
}

impl<F> CellHandler for F
where
    F: FnMut(usize, usize, &CellBuffer<'_>) -> CellAction,
{
    #[inline]
    fn handle_cell(&mut self, row: usize, column: usize, cell: &CellBuffer<'_>) -> CellAction {
        self(row, column, cell)
    }
}

/// Handler that collects every cell into rows of owned strings.
#[derive(Debug, Clone, Default)]
pub struct RowCollector {
    pub rows: Vec<Vec<String>>,
}

impl RowCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }
}

impl CellHandler for RowCollector {
    fn handle_cell(&mut self, row: usize, column: usize, cell: &CellBuffer<'_>) -> CellAction {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() < column {
            cells.resize_with(column, String::new);
        }
        cells.push(cell.text().into_owned());
        CellAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(ReadState::SeparatorSeen.is_cell_end());
        assert!(!ReadState::PastEnclosedCell.is_cell_end());
        assert!(ReadState::Terminated.is_terminal());
        assert!(!ReadState::EolSeen.is_terminal());
    }

    #[test]
    fn test_action_predicates() {
        assert!(CellAction::SkipAndTerminate.skips_line());
        assert!(CellAction::SkipAndTerminate.terminates());
        assert!(!CellAction::SkipRestOfLine.terminates());
        assert!(!CellAction::Continue.skips_line());
    }
}
