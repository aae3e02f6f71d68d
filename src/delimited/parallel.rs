//! Partitioned reads on a rayon pool.
//!
//! Only formats the barebones reader accepts are split: without an
//! enclosing character every end-of-line byte ends a row, so a chunk that
//! starts right after one is a valid input on its own. Each chunk is read
//! into its own [`TableSz`] and the tables are merged in order.

use super::appender::CharAppender;
use super::barebones;
use super::format::FormatDefinition;
use super::reader::{ParserKind, ReadOptions, ReadSummary};
use crate::common::bom::resolve_encoding;
use crate::common::{Error, Result};
use crate::table::{TableSz, TableSzHandler, read_slice_into_table};
use memchr::memchr;
use rayon::prelude::*;
use std::sync::atomic::Ordering;
use tracing::debug;

/// Reads `data` into `table`, splitting the work across
/// `options.thread_count` threads when the format allows it.
///
/// Returns the summary and the number of cells the table rejected. The
/// result is the same as a sequential [`read_slice_into_table`].
pub fn read_parallel_into_table(
    data: &[u8],
    format: &FormatDefinition,
    options: &ReadOptions,
    table: &mut TableSz,
) -> Result<(ReadSummary, usize)> {
    if options.thread_count == 0 {
        return Err(Error::InvalidFormat("thread count must be at least 1".to_string()));
    }

    let (encoding, start) = resolve_encoding(format.encoding, &data[..data.len().min(4)]);
    let splittable = options.parser == ParserKind::Auto
        && matches!(options.appender, None | Some(CharAppender::View))
        && barebones::is_eligible(format, encoding);
    let eol = match format.eol.as_char() {
        Some(eol) if splittable && options.thread_count > 1 => eol as u8,
        _ => {
            debug!("partitioned read not possible, reading sequentially");
            return read_slice_into_table(data, format, options, table);
        },
    };

    let splits = split_points(data, start, eol, options.thread_count, options.thread_block_size_minimum);
    if splits.len() <= 2 {
        debug!(len = data.len(), "input too small to partition");
        return read_slice_into_table(data, format, options, table);
    }
    debug!(chunks = splits.len() - 1, threads = options.thread_count, "partitioned read");

    // The chunks start after the byte order mark.
    if let Some(progress) = &options.progress {
        progress.fetch_add(start as u64, Ordering::Relaxed);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.thread_count)
        .build()
        .map_err(|e| Error::Other(format!("Failed to build thread pool: {}", e)))?;

    let config = *table.config();
    let chunks: Vec<&[u8]> = splits.windows(2).map(|w| &data[w[0]..w[1]]).collect();
    let results: Vec<Result<(TableSz, ReadSummary, usize)>> = pool.install(|| {
        chunks
            .par_iter()
            .map(|chunk| -> Result<(TableSz, ReadSummary, usize)> {
                let mut chunk_table = TableSz::with_config(config);
                let mut handler = TableSzHandler::new(&mut chunk_table);
                let summary = barebones::read(chunk, 0, encoding, format, options, &mut handler)?;
                let failed = handler.failed();
                Ok((chunk_table, summary, failed))
            })
            .collect()
    });

    let mut rows = 0;
    let mut bytes_read = start;
    let mut failed = 0;
    for result in results {
        let (chunk_table, summary, chunk_failed) = result?;
        failed += chunk_failed + table.append_rows_from(&chunk_table, rows);
        rows += summary.rows;
        bytes_read += summary.bytes_read;
    }

    Ok((
        ReadSummary {
            rows,
            bytes_read,
            terminated: false,
            separator: format.separator,
            eol: format.eol,
            encoding,
            barebones: true,
        },
        failed,
    ))
}

/// Chunk boundaries: `start`, the byte after the first `eol` at or past each
/// nominal cut, and `data.len()`.
fn split_points(data: &[u8], start: usize, eol: u8, threads: usize, minimum: usize) -> Vec<usize> {
    let len = data.len();
    let chunk_size = ((len - start.min(len)) / threads).max(minimum).max(1);

    let mut splits = vec![start.min(len)];
    let mut nominal = start + chunk_size;
    while nominal < len {
        let Some(offset) = memchr(eol, &data[nominal..]) else {
            break;
        };
        let split = nominal + offset + 1;
        if split >= len {
            break;
        }
        splits.push(split);
        nominal = split + chunk_size;
    }
    splits.push(len);
    splits.dedup();
    splits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TextEncoding;

    fn sample(rows: usize) -> Vec<u8> {
        let mut data = Vec::new();
        for row in 0..rows {
            if row % 7 == 3 {
                data.extend_from_slice(b"\r\n");
                continue;
            }
            data.extend_from_slice(format!("r{row},{},x{}\r\n", row * 3, "y".repeat(row % 5)).as_bytes());
        }
        data.extend_from_slice(b"last,,");
        data
    }

    fn bare() -> FormatDefinition {
        FormatDefinition::fixed(',', None, '\n')
    }

    fn assert_same(a: &TableSz, b: &TableSz) {
        assert_eq!(a.row_indices(), b.row_indices());
        assert_eq!(a.col_count(), b.col_count());
        for row in a.row_indices() {
            for col in 0..a.col_count() {
                assert_eq!(a.get(row, col), b.get(row, col), "cell ({row}, {col})");
            }
        }
    }

    #[test]
    fn test_split_points_follow_eol() {
        let data = b"aa\nbb\ncc\ndd\n";
        assert_eq!(split_points(data, 0, b'\n', 4, 1), vec![0, 6, 12]);
        assert_eq!(split_points(data, 0, b'\n', 2, 100), vec![0, 12]);
    }

    #[test]
    fn test_matches_sequential() {
        let data = sample(500);
        let options = ReadOptions::new().with_thread_count(4).with_thread_block_size_minimum(256);

        let mut sequential = TableSz::new();
        let (expected, _) = read_slice_into_table(&data, &bare(), &ReadOptions::default(), &mut sequential).unwrap();

        let mut parallel = TableSz::new();
        let (summary, failed) = read_parallel_into_table(&data, &bare(), &options, &mut parallel).unwrap();

        assert_eq!(failed, 0);
        assert!(summary.barebones);
        assert_eq!(summary.rows, expected.rows);
        assert_eq!(summary.bytes_read, data.len());
        assert_same(&sequential, &parallel);
    }

    fn progress_after(data: &[u8], threads: usize) -> u64 {
        let progress = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));
        let options = ReadOptions::new()
            .with_thread_count(threads)
            .with_thread_block_size_minimum(128)
            .with_progress(progress.clone());
        let mut table = TableSz::new();
        read_parallel_into_table(data, &bare(), &options, &mut table).unwrap();
        progress.load(Ordering::Relaxed)
    }

    #[test]
    fn test_progress_counts_every_byte() {
        let data = sample(200);
        assert_eq!(progress_after(&data, 3), data.len() as u64);

        let mut with_bom = vec![0xEF, 0xBB, 0xBF];
        with_bom.extend_from_slice(&data);
        assert_eq!(progress_after(&with_bom, 3), with_bom.len() as u64);
        assert_eq!(progress_after(&with_bom, 1), with_bom.len() as u64);
    }

    #[test]
    fn test_enclosed_format_falls_back() {
        let data = b"\"a\nb\",c\nd,e\n";
        let options = ReadOptions::new().with_thread_count(4).with_thread_block_size_minimum(1);
        let mut table = TableSz::new();
        let (summary, _) = read_parallel_into_table(data, &FormatDefinition::csv(), &options, &mut table).unwrap();
        assert!(!summary.barebones);
        assert_eq!(table.get(0, 0), Some("a\nb"));
        assert_eq!(table.get(1, 1), Some("e"));
    }

    #[test]
    fn test_bom_is_skipped_once() {
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice(b"a,b\nc,d\ne,f\n");
        let options = ReadOptions::new().with_thread_count(2).with_thread_block_size_minimum(1);
        let mut table = TableSz::new();
        let (summary, _) = read_parallel_into_table(&data, &bare(), &options, &mut table).unwrap();
        assert_eq!(summary.encoding, TextEncoding::Utf8);
        assert_eq!(summary.rows, 3);
        assert_eq!(table.get(0, 0), Some("a"));
        assert_eq!(table.get(2, 1), Some("f"));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let options = ReadOptions::new().with_thread_count(0);
        let mut table = TableSz::new();
        assert!(read_parallel_into_table(b"a", &bare(), &options, &mut table).is_err());
    }
}
