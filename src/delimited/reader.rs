//! Character-level state machine for delimited text.
//!
//! The reader consumes one logical character at a time, classifies each cell
//! as naked or enclosed, resolves doubled enclosing characters, keeps text
//! found after a closing enclosing character and hands every completed cell
//! to a [`CellHandler`].

use super::appender::CharAppender;
use super::barebones;
use super::buffer::CellBuffer;
use super::format::{FormatChar, FormatDefinition, SEPARATOR_CANDIDATES};
use super::source::{ByteSource, SliceSource, StreamSource, UnitReader};
use super::state::{CellHandler, ReadState};
use crate::common::bom::resolve_encoding;
use crate::common::{Result, TextEncoding};
use std::fs::File;
use std::io::Read;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Characters an auto-detected enclosing setting accepts at the start of a cell.
pub const ENCLOSING_CANDIDATES: [char; 2] = ['"', '\''];

/// Characters an auto-detected end-of-line setting accepts.
pub const EOL_CANDIDATES: [char; 2] = ['\n', '\r'];

/// Which parsing engine [`read_slice`] may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParserKind {
    /// The barebones fast path when the format allows it, otherwise the
    /// generic state machine
    #[default]
    Auto,
    /// Always the generic state machine
    Generic,
}

/// Options of a single read.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Appender strategy; `None` picks decoding (views on the fast path)
    pub appender: Option<CharAppender>,
    /// Parsing engine selection
    pub parser: ParserKind,
    /// Read buffer size for stream input
    pub buffer_size: usize,
    /// Counter incremented with the bytes consumed after every row
    pub progress: Option<Arc<AtomicU64>>,
    /// Worker threads for partitioned reads
    pub thread_count: usize,
    /// Smallest chunk handed to one worker in partitioned reads
    pub thread_block_size_minimum: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            appender: None,
            parser: ParserKind::Auto,
            buffer_size: 8192,           // 8KB buffer
            progress: None,
            thread_count: 1,
            thread_block_size_minimum: 64 * 1024,
        }
    }
}

impl ReadOptions {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the appender strategy
    pub fn with_appender(mut self, appender: CharAppender) -> Self {
        self.appender = Some(appender);
        self
    }

    /// Set the parsing engine selection
    pub fn with_parser(mut self, parser: ParserKind) -> Self {
        self.parser = parser;
        self
    }

    /// Set buffer size
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the shared progress counter
    pub fn with_progress(mut self, progress: Arc<AtomicU64>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Set the worker thread count for partitioned reads
    pub fn with_thread_count(mut self, count: usize) -> Self {
        self.thread_count = count;
        self
    }

    /// Set the minimum chunk size for partitioned reads
    pub fn with_thread_block_size_minimum(mut self, size: usize) -> Self {
        self.thread_block_size_minimum = size;
        self
    }
}

/// Outcome of a completed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSummary {
    /// Rows handed to the handler, including skipped ones
    pub rows: usize,
    /// Bytes consumed, byte order mark included
    pub bytes_read: usize,
    /// Whether the handler stopped the read
    pub terminated: bool,
    /// Separator in effect at the end of the read
    pub separator: FormatChar,
    /// End-of-line character in effect at the end of the read
    pub eol: FormatChar,
    /// Encoding the input was decoded with
    pub encoding: TextEncoding,
    /// Whether the barebones fast path did the work
    pub barebones: bool,
}

/// Generic delimited text reader.
pub struct DelimitedReader<'s, S: ByteSource> {
    units: UnitReader<S>,
    separator: FormatChar,
    enclosing: FormatChar,
    eol: FormatChar,
    rn_folding: bool,
    skip_leading_whitespace: bool,
    appender: CharAppender,
    buffer: CellBuffer<'s>,
    pending: Option<(char, Range<usize>)>,
    last_terminator_start: usize,
    state: ReadState,
    progress: Option<Arc<AtomicU64>>,
    reported: usize,
}

impl<'s> DelimitedReader<'s, SliceSource<'s>> {
    /// Create a reader over an in-memory buffer
    pub fn from_slice(data: &'s [u8], format: &FormatDefinition, options: &ReadOptions) -> Result<Self> {
        Self::with_source(SliceSource::new(data), data, true, format, options)
    }
}

impl<R: Read> DelimitedReader<'static, StreamSource<R>> {
    /// Create a reader over a forward-only stream
    pub fn from_reader(reader: R, format: &FormatDefinition, options: &ReadOptions) -> Result<Self> {
        let source = StreamSource::new(reader, options.buffer_size);
        Self::with_source(source, &[], false, format, options)
    }
}

impl<'s, S: ByteSource> DelimitedReader<'s, S> {
    fn with_source(
        mut source: S,
        view_source: &'s [u8],
        is_slice: bool,
        format: &FormatDefinition,
        options: &ReadOptions,
    ) -> Result<Self> {
        let (encoding, bom_len) = resolve_encoding(format.encoding, source.peek_prefix(4)?);
        source.skip(bom_len)?;
        debug!(%encoding, bom_len, "resolved input encoding");

        let appender = options.appender.unwrap_or_default();
        appender.validate(format, encoding, is_slice)?;

        Ok(DelimitedReader {
            units: UnitReader::new(source, encoding),
            separator: format.separator,
            enclosing: format.enclosing,
            eol: format.eol,
            rn_folding: !format.flags.contains(super::format::FormatFlags::NO_RN_FOLDING),
            skip_leading_whitespace: format.skip_leading_whitespace(),
            appender,
            buffer: CellBuffer::with_source(view_source, encoding),
            pending: None,
            last_terminator_start: 0,
            state: ReadState::LookingForData,
            progress: options.progress.clone(),
            reported: 0,
        })
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> ReadState {
        self.state
    }

    /// The last completed cell.
    #[inline]
    pub fn buffer(&self) -> &CellBuffer<'s> {
        &self.buffer
    }

    /// Mutable access to the cell buffer, e.g. to change the whitespace set.
    #[inline]
    pub fn buffer_mut(&mut self) -> &mut CellBuffer<'s> {
        &mut self.buffer
    }

    /// Separator in effect; reflects auto-detection once it happened.
    #[inline]
    pub fn separator(&self) -> FormatChar {
        self.separator
    }

    #[inline]
    pub fn eol(&self) -> FormatChar {
        self.eol
    }

    #[inline]
    pub fn encoding(&self) -> TextEncoding {
        self.units.encoding()
    }

    /// Byte offset of the next unread character.
    #[inline]
    pub fn position(&self) -> usize {
        self.pending
            .as_ref()
            .map_or_else(|| self.units.position(), |(_, range)| range.start)
    }

    /// Reads the next logical character, folding `\r\n` into `\n`.
    fn next_char(&mut self) -> Result<Option<(char, Range<usize>)>> {
        let (ch, range) = match self.pending.take() {
            Some(pending) => pending,
            None => {
                let start = self.units.position();
                let Some(ch) = self.appender.read_char(&mut self.units)? else {
                    return Ok(None);
                };
                (ch, start..self.units.position())
            },
        };

        if ch == '\r' && self.rn_folding && matches!(self.eol, FormatChar::Char('\n') | FormatChar::Auto) {
            let lookahead_start = self.units.position();
            match self.appender.read_char(&mut self.units)? {
                Some('\n') => return Ok(Some(('\n', range.start..self.units.position()))),
                Some(other) => self.pending = Some((other, lookahead_start..self.units.position())),
                None => {},
            }
        }

        Ok(Some((ch, range)))
    }

    fn match_separator(&mut self, ch: char) -> bool {
        match self.separator {
            FormatChar::Char(separator) => separator == ch,
            FormatChar::None => false,
            FormatChar::Auto => {
                if SEPARATOR_CANDIDATES.contains(&ch) {
                    debug!(separator = ?ch, "auto-detected separator");
                    self.separator = FormatChar::Char(ch);
                    true
                } else {
                    false
                }
            },
        }
    }

    fn match_eol(&mut self, ch: char) -> bool {
        match self.eol {
            FormatChar::Char(eol) => eol == ch,
            FormatChar::None => false,
            FormatChar::Auto => {
                if EOL_CANDIDATES.contains(&ch) {
                    debug!(eol = ?ch, "auto-detected end of line");
                    self.eol = FormatChar::Char(ch);
                    true
                } else {
                    false
                }
            },
        }
    }

    fn match_enclosing_start(&mut self, ch: char) -> Option<char> {
        match self.enclosing {
            FormatChar::Char(enclosing) if enclosing == ch => Some(ch),
            FormatChar::Auto if ENCLOSING_CANDIDATES.contains(&ch) => {
                debug!(enclosing = ?ch, "auto-detected enclosing character");
                self.enclosing = FormatChar::Char(ch);
                Some(ch)
            },
            _ => None,
        }
    }

    /// Cell end triggered by `ch`, if any. Separators take precedence.
    fn terminator(&mut self, ch: char) -> Option<ReadState> {
        if self.match_separator(ch) {
            Some(ReadState::SeparatorSeen)
        } else if self.match_eol(ch) {
            Some(ReadState::EolSeen)
        } else {
            None
        }
    }

    /// Reads one cell into the buffer and returns how it ended.
    ///
    /// The separator or end of line that ends the cell is consumed but not
    /// part of the content.
    pub fn read_cell(&mut self) -> Result<ReadState> {
        self.buffer.clear();
        self.state = ReadState::LookingForData;
        let cell_start = self.position();

        let mut current = self.next_char()?;
        if self.skip_leading_whitespace {
            while let Some((ch, _)) = &current {
                let ch = *ch;
                if !self.buffer.is_whitespace(ch) || self.terminator(ch).is_some() {
                    break;
                }
                current = self.next_char()?;
            }
        }

        let end = match current {
            None => ReadState::EndOfStream,
            Some((ch, range)) => match self.match_enclosing_start(ch) {
                Some(enclosing) => {
                    self.buffer.mark_enclosed();
                    self.read_enclosed(enclosing)?
                },
                None => self.read_unenclosed((ch, range), ReadState::NakedCell)?,
            },
        };

        let content_end = match end {
            // The terminator was one character, possibly a folded `\r\n`
            ReadState::SeparatorSeen | ReadState::EolSeen => self.last_terminator_start,
            _ => self.position(),
        };
        self.buffer.set_raw_byte_count(content_end.saturating_sub(cell_start));
        self.state = end;
        Ok(end)
    }

    fn read_unenclosed(&mut self, first: (char, Range<usize>), state: ReadState) -> Result<ReadState> {
        self.state = state;
        let mut current = Some(first);
        while let Some((ch, range)) = current {
            if let Some(end) = self.terminator(ch) {
                self.last_terminator_start = range.start;
                return Ok(end);
            }
            self.appender.append(&mut self.buffer, ch, range);
            current = self.next_char()?;
        }
        Ok(ReadState::EndOfStream)
    }

    fn read_enclosed(&mut self, enclosing: char) -> Result<ReadState> {
        self.state = ReadState::InEnclosedCell;
        loop {
            let Some((ch, range)) = self.next_char()? else {
                // Unterminated enclosure: the end of input closes it
                return Ok(ReadState::EndOfStream);
            };
            // Kept tentatively; the lookahead decides whether it closes the cell
            self.appender.append(&mut self.buffer, ch, range);
            if ch != enclosing {
                continue;
            }

            match self.next_char()? {
                None => {
                    self.appender.pop_back(&mut self.buffer);
                    return Ok(ReadState::EndOfStream);
                },
                // Doubled enclosing character: one literal stays in the buffer
                Some((next, _)) if next == enclosing => {},
                Some((next, next_range)) => {
                    self.appender.pop_back(&mut self.buffer);
                    if let Some(end) = self.terminator(next) {
                        self.last_terminator_start = next_range.start;
                        return Ok(end);
                    }
                    return self.read_unenclosed((next, next_range), ReadState::PastEnclosedCell);
                },
            }
        }
    }

    /// Reads the cells of one line and hands them to `handler` as `row`.
    ///
    /// Returns `false` when the input ended before anything of the row was
    /// read; such a row is not reported.
    pub fn read_row<H: CellHandler + ?Sized>(&mut self, row: usize, handler: &mut H) -> Result<bool> {
        let mut column = 0;
        let mut skipping = false;
        let mut terminate_at_eol = false;
        let appender = self.appender;

        let result = loop {
            let cell_start = self.position();
            let end = self.read_cell()?;
            if end == ReadState::EndOfStream && column == 0 && self.position() == cell_start {
                break false;
            }

            if !skipping {
                let action = handler.handle_cell(row, column, &self.buffer);
                if action.terminates() && !action.skips_line() {
                    self.state = ReadState::Terminated;
                    break true;
                }
                if action.skips_line() {
                    skipping = true;
                    terminate_at_eol = action.terminates();
                    self.appender = CharAppender::Discard;
                }
            }

            match end {
                ReadState::SeparatorSeen => column += 1,
                _ => {
                    if terminate_at_eol {
                        self.state = ReadState::Terminated;
                    }
                    break true;
                },
            }
        };

        self.appender = appender;
        self.report_progress();
        Ok(result)
    }

    /// Reads until the end of input or until the handler terminates.
    pub fn read<H: CellHandler + ?Sized>(&mut self, handler: &mut H) -> Result<ReadSummary> {
        let mut rows = 0;
        while !self.state.is_terminal() {
            if self.read_row(rows, handler)? {
                rows += 1;
            }
        }
        Ok(self.summary(rows))
    }

    fn summary(&self, rows: usize) -> ReadSummary {
        ReadSummary {
            rows,
            bytes_read: self.position(),
            terminated: self.state == ReadState::Terminated,
            separator: self.separator,
            eol: self.eol,
            encoding: self.units.encoding(),
            barebones: false,
        }
    }

    fn report_progress(&mut self) {
        let position = self.position();
        if let Some(progress) = &self.progress {
            progress.fetch_add((position - self.reported) as u64, Ordering::Relaxed);
        }
        self.reported = position;
    }
}

/// Reads delimited text from an in-memory buffer.
///
/// Uses the barebones fast path when the format and options allow it.
pub fn read_slice<H: CellHandler + ?Sized>(
    data: &[u8],
    format: &FormatDefinition,
    options: &ReadOptions,
    handler: &mut H,
) -> Result<ReadSummary> {
    let (encoding, bom_len) = resolve_encoding(format.encoding, &data[..data.len().min(4)]);
    let view_allowed = matches!(options.appender, None | Some(CharAppender::View));
    if options.parser == ParserKind::Auto && view_allowed && barebones::is_eligible(format, encoding) {
        debug!("using barebones parser");
        return barebones::read(data, bom_len, encoding, format, options, handler);
    }

    debug!("using generic parser");
    DelimitedReader::from_slice(data, format, options)?.read(handler)
}

/// Reads delimited text from a forward-only stream.
pub fn read_stream<R: Read, H: CellHandler + ?Sized>(
    reader: R,
    format: &FormatDefinition,
    options: &ReadOptions,
    handler: &mut H,
) -> Result<ReadSummary> {
    DelimitedReader::from_reader(reader, format, options)?.read(handler)
}

/// Reads delimited text from a file.
pub fn read_path<P: AsRef<Path>, H: CellHandler + ?Sized>(
    path: P,
    format: &FormatDefinition,
    options: &ReadOptions,
    handler: &mut H,
) -> Result<ReadSummary> {
    let file = File::open(path)?;
    read_stream(file, format, options, handler)
}
