//! Accumulator for the cell currently being read.

use crate::common::TextEncoding;
use crate::common::encoding::decode_single_byte;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::ops::Range;

/// Whitespace skipped by default when leading whitespace trimming is on.
pub const DEFAULT_WHITESPACE: [char; 2] = [' ', '\t'];

/// Content of one cell, reused from cell to cell.
///
/// The content is either owned text or a byte range into the source
/// buffer, depending on the [`CharAppender`](super::appender::CharAppender)
/// in use. Clearing is O(1) and keeps the allocation.
#[derive(Debug, Clone)]
pub struct CellBuffer<'s> {
    text: String,
    view: Option<Range<usize>>,
    last_view_start: usize,
    source: &'s [u8],
    view_encoding: TextEncoding,
    whitespace: SmallVec<[char; 4]>,
    raw_byte_count: usize,
    enclosed: bool,
}

impl Default for CellBuffer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'s> CellBuffer<'s> {
    /// A buffer for owned content.
    pub fn new() -> Self {
        Self::with_source(&[], TextEncoding::Utf8)
    }

    /// A buffer that may hold views into `source`, which is encoded with the
    /// single-byte `encoding`.
    pub fn with_source(source: &'s [u8], encoding: TextEncoding) -> Self {
        CellBuffer {
            text: String::with_capacity(64),
            view: None,
            last_view_start: 0,
            source,
            view_encoding: encoding,
            whitespace: SmallVec::from_slice(&DEFAULT_WHITESPACE),
            raw_byte_count: 0,
            enclosed: false,
        }
    }

    /// Empties the buffer for the next cell.
    #[inline]
    pub fn clear(&mut self) {
        self.text.clear();
        self.view = None;
        self.raw_byte_count = 0;
        self.enclosed = false;
    }

    /// Replaces the set of characters skipped as leading whitespace.
    pub fn set_whitespace_chars(&mut self, chars: impl IntoIterator<Item = char>) {
        self.whitespace = chars.into_iter().collect();
    }

    #[inline]
    pub fn is_whitespace(&self, ch: char) -> bool {
        self.whitespace.contains(&ch)
    }

    #[inline]
    pub(crate) fn push_char(&mut self, ch: char) {
        self.text.push(ch);
    }

    /// Extends the view to cover `range`, which must directly follow it.
    #[inline]
    pub(crate) fn push_view(&mut self, range: Range<usize>) {
        self.last_view_start = range.start;
        match &mut self.view {
            Some(view) => view.end = range.end,
            None => self.view = Some(range),
        }
    }

    /// Sets the whole view at once.
    #[inline]
    pub(crate) fn set_view(&mut self, range: Range<usize>) {
        self.last_view_start = range.start;
        self.view = Some(range);
    }

    /// Removes the last logical character.
    pub(crate) fn pop_back(&mut self) -> bool {
        if let Some(view) = &mut self.view {
            if view.end == view.start {
                return false;
            }
            view.end = self.last_view_start.max(view.start);
            return true;
        }
        self.text.pop().is_some()
    }

    #[inline]
    pub(crate) fn set_raw_byte_count(&mut self, count: usize) {
        self.raw_byte_count = count;
    }

    #[inline]
    pub(crate) fn mark_enclosed(&mut self) {
        self.enclosed = true;
    }

    /// Number of source bytes consumed by this cell, separators excluded.
    #[inline]
    pub fn raw_byte_count(&self) -> usize {
        self.raw_byte_count
    }

    /// Whether the cell started with the enclosing character.
    #[inline]
    pub fn was_enclosed(&self) -> bool {
        self.enclosed
    }

    /// Byte range into the source when the content is a view.
    #[inline]
    pub fn view_range(&self) -> Option<Range<usize>> {
        self.view.clone()
    }

    /// Whether the cell has no content.
    pub fn is_empty(&self) -> bool {
        match &self.view {
            Some(view) => view.is_empty(),
            None => self.text.is_empty(),
        }
    }

    /// The cell content.
    ///
    /// Borrowed for owned content and for valid UTF-8 views; views in other
    /// single-byte encodings are decoded.
    pub fn text(&self) -> Cow<'_, str> {
        match &self.view {
            Some(view) => decode_single_byte(self.view_encoding, &self.source[view.clone()]),
            None => Cow::Borrowed(&self.text),
        }
    }
}
