//! Strategies for turning input code units into cell content.

use super::buffer::CellBuffer;
use super::format::FormatDefinition;
use super::source::{ByteSource, UnitReader};
use crate::common::encoding::{TextEncoding, UnitStream, decode_next};
use crate::common::{Error, Result};
use std::ops::Range;

/// Replacement for raw units that are not valid characters.
pub const RAW_REPLACEMENT: char = '?';

/// How characters read from the input end up in the [`CellBuffer`].
///
/// The strategy is chosen once per read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CharAppender {
    /// Every code unit is one character; units that are not valid
    /// characters become [`RAW_REPLACEMENT`]
    Raw,
    /// Multi-unit sequences are decoded into full code points and stored
    /// as UTF-8
    #[default]
    Decoding,
    /// Only a byte range into the source is recorded. Requires slice
    /// input, a single-byte encoding and no enclosing character.
    View,
    /// Nothing is recorded
    Discard,
}

impl CharAppender {
    /// Checks that this strategy can serve `format` on the given input.
    pub fn validate(self, format: &FormatDefinition, encoding: TextEncoding, is_slice: bool) -> Result<()> {
        if self != CharAppender::View {
            return Ok(());
        }
        if !is_slice {
            return Err(Error::InvalidFormat("view appender requires in-memory input".to_string()));
        }
        if format.enclosing.as_char().is_some() || format.enclosing.is_auto() {
            return Err(Error::InvalidFormat(
                "view appender cannot be combined with an enclosing character".to_string(),
            ));
        }
        if !encoding.is_single_byte() {
            return Err(Error::InvalidFormat(format!(
                "view appender requires a single-byte encoding, got {}",
                encoding
            )));
        }
        Ok(())
    }

    /// Reads the next logical character.
    #[inline]
    pub(crate) fn read_char<S: ByteSource>(self, units: &mut UnitReader<S>) -> Result<Option<char>> {
        match self {
            CharAppender::Raw => Ok(units.next_unit()?.map(raw_char)),
            CharAppender::Decoding | CharAppender::View | CharAppender::Discard => {
                let encoding = units.encoding();
                decode_next(encoding, units)
            },
        }
    }

    /// Appends `ch`, which was read from the source bytes in `range`.
    #[inline]
    pub(crate) fn append(self, buffer: &mut CellBuffer<'_>, ch: char, range: Range<usize>) {
        match self {
            CharAppender::Raw | CharAppender::Decoding => buffer.push_char(ch),
            CharAppender::View => buffer.push_view(range),
            CharAppender::Discard => {},
        }
    }

    /// Retracts the last appended character.
    #[inline]
    pub(crate) fn pop_back(self, buffer: &mut CellBuffer<'_>) {
        if self != CharAppender::Discard {
            buffer.pop_back();
        }
    }
}

/// Interprets one raw code unit as a character.
#[inline]
pub fn raw_char(unit: u32) -> char {
    char::from_u32(unit).unwrap_or(RAW_REPLACEMENT)
}
