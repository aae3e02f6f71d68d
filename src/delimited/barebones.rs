//! Zero-copy fast path for simple formats.
//!
//! When a format has no enclosing character, concrete ASCII separator and
//! end-of-line characters and no whitespace trimming, every separator and
//! end-of-line byte in the input is structural. Cells can then be found with
//! a single `memchr2` scan and handed out as views into the source buffer,
//! without running the character state machine.

use super::buffer::CellBuffer;
use super::format::{FormatChar, FormatDefinition};
use super::reader::{ReadOptions, ReadSummary};
use super::state::CellHandler;
use crate::common::{Result, TextEncoding};
use memchr::memchr2;
use std::sync::atomic::Ordering;

/// Whether `format` can be read by the fast path when decoded with `encoding`.
pub fn is_eligible(format: &FormatDefinition, encoding: TextEncoding) -> bool {
    format.enclosing == FormatChar::None
        && ascii_byte(format.separator).is_some()
        && ascii_byte(format.eol).is_some()
        && !format.skip_leading_whitespace()
        && encoding.is_single_byte()
}

#[inline]
fn ascii_byte(ch: FormatChar) -> Option<u8> {
    match ch {
        FormatChar::Char(ch) if ch.is_ascii() => Some(ch as u8),
        _ => None,
    }
}

/// Reads `data`, starting at byte `start` (after any byte order mark).
///
/// Row and cell numbering, the handling of empty lines and the handler
/// actions match the generic reader.
pub fn read<H: CellHandler + ?Sized>(
    data: &[u8],
    start: usize,
    encoding: TextEncoding,
    format: &FormatDefinition,
    options: &ReadOptions,
    handler: &mut H,
) -> Result<ReadSummary> {
    let (Some(separator), Some(eol)) = (ascii_byte(format.separator), ascii_byte(format.eol)) else {
        return Err(crate::common::Error::InvalidFormat(
            "barebones parsing needs concrete ASCII separator and end of line".to_string(),
        ));
    };
    let fold = format.rn_folding() && eol == b'\n';

    let mut buffer = CellBuffer::with_source(data, encoding);
    let mut pos = start.min(data.len());
    let mut reported = 0;
    let mut row = 0;
    let mut column = 0;
    let mut skipping = false;
    let mut terminate_at_eol = false;
    let mut terminated = false;

    loop {
        if pos >= data.len() && column == 0 {
            break;
        }

        let (cell_end, next, ends_line, at_eof) = match memchr2(separator, eol, &data[pos..]) {
            // Separator wins when both are the same byte
            Some(offset) => {
                let at = pos + offset;
                (at, at + 1, data[at] != separator, false)
            },
            None => (data.len(), data.len(), true, true),
        };

        let mut content_end = cell_end;
        if fold && ends_line && !at_eof && content_end > pos && data[content_end - 1] == b'\r' {
            content_end -= 1;
        }

        buffer.clear();
        buffer.set_view(pos..content_end);
        buffer.set_raw_byte_count(content_end - pos);
        pos = next;

        if !skipping {
            let action = handler.handle_cell(row, column, &buffer);
            if action.terminates() && !action.skips_line() {
                terminated = true;
                row += 1;
                break;
            }
            if action.skips_line() {
                skipping = true;
                terminate_at_eol = action.terminates();
            }
        }

        if !ends_line {
            column += 1;
            continue;
        }

        row += 1;
        column = 0;
        skipping = false;
        if let Some(progress) = &options.progress {
            progress.fetch_add((pos - reported) as u64, Ordering::Relaxed);
        }
        reported = pos;
        if terminate_at_eol {
            terminated = true;
            break;
        }
        if at_eof {
            break;
        }
    }

    if let Some(progress) = &options.progress {
        progress.fetch_add((pos - reported) as u64, Ordering::Relaxed);
    }

    Ok(ReadSummary {
        rows: row,
        bytes_read: pos,
        terminated,
        separator: format.separator,
        eol: format.eol,
        encoding,
        barebones: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delimited::state::{CellAction, RowCollector};

    fn bare() -> FormatDefinition {
        FormatDefinition::fixed(',', None, '\n')
    }

    fn collect(input: &[u8]) -> (Vec<Vec<String>>, ReadSummary) {
        let mut collector = RowCollector::new();
        let summary = read(input, 0, TextEncoding::Utf8, &bare(), &ReadOptions::default(), &mut collector).unwrap();
        (collector.into_rows(), summary)
    }

    #[test]
    fn test_eligibility() {
        assert!(is_eligible(&bare(), TextEncoding::Utf8));
        assert!(!is_eligible(&FormatDefinition::csv(), TextEncoding::Utf8));
        assert!(!is_eligible(&bare(), TextEncoding::Utf16Le));
        assert!(!is_eligible(&bare().with_separator(FormatChar::Auto), TextEncoding::Utf8));
        assert!(!is_eligible(&bare().with_skip_leading_whitespace(true), TextEncoding::Utf8));
    }

    #[test]
    fn test_rows_and_empty_cells() {
        let (rows, summary) = collect(b"a,,c\n\nd");
        assert_eq!(rows, vec![vec!["a", "", "c"], vec![""], vec!["d"]]);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.bytes_read, 7);
        assert!(summary.barebones);
    }

    #[test]
    fn test_crlf_folding() {
        let (rows, _) = collect(b"a,b\r\nc\r");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c\r"]]);
    }

    #[test]
    fn test_trailing_separator_at_eof() {
        let (rows, summary) = collect(b"a,");
        assert_eq!(rows, vec![vec!["a", ""]]);
        assert_eq!(summary.rows, 1);
    }

    #[test]
    fn test_views_are_zero_copy() {
        let input = b"left,right\n";
        let mut ranges = Vec::new();
        let mut handler = |_: usize, _: usize, cell: &CellBuffer<'_>| {
            ranges.push(cell.view_range());
            CellAction::Continue
        };
        read(input, 0, TextEncoding::Utf8, &bare(), &ReadOptions::default(), &mut handler).unwrap();
        assert_eq!(ranges, vec![Some(0..4), Some(5..10)]);
    }

    #[test]
    fn test_skip_and_terminate() {
        let mut seen = Vec::new();
        let mut handler = |row: usize, column: usize, _: &CellBuffer<'_>| {
            seen.push((row, column));
            if column == 0 { CellAction::SkipAndTerminate } else { CellAction::Continue }
        };
        let summary =
            read(b"a,b,c\nd\n", 0, TextEncoding::Utf8, &bare(), &ReadOptions::default(), &mut handler).unwrap();
        assert_eq!(seen, vec![(0, 0)]);
        assert!(summary.terminated);
        assert_eq!(summary.bytes_read, 6);
    }
}
