//! Character encoding utilities for delimited text.
//!
//! This module defines the closed set of text encodings the reader and the
//! writer understand, how raw bytes are grouped into code units for each of
//! them, and how code units are decoded into code points. Windows-1252 uses
//! the `encoding_rs` tables; the Unicode transformation formats are decoded
//! unit by unit so that the reader can stop at any character boundary.

use crate::common::Result;
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::char::REPLACEMENT_CHARACTER;

/// Text encodings supported by the delimited reader and writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextEncoding {
    /// Decided from a byte order mark, UTF-8 when there is none
    #[default]
    Unknown,
    Latin1,
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
    Ucs2Le,
    Ucs2Be,
    Ucs4Le,
    Ucs4Be,
    Windows1252,
}

/// Every encoding, in persistence order.
pub const ALL_ENCODINGS: [TextEncoding; 12] = [
    TextEncoding::Unknown,
    TextEncoding::Latin1,
    TextEncoding::Utf8,
    TextEncoding::Utf16Le,
    TextEncoding::Utf16Be,
    TextEncoding::Utf32Le,
    TextEncoding::Utf32Be,
    TextEncoding::Ucs2Le,
    TextEncoding::Ucs2Be,
    TextEncoding::Ucs4Le,
    TextEncoding::Ucs4Be,
    TextEncoding::Windows1252,
];

impl TextEncoding {
    /// Number of bytes in one code unit.
    #[inline]
    pub const fn unit_width(self) -> usize {
        match self {
            TextEncoding::Unknown
            | TextEncoding::Latin1
            | TextEncoding::Utf8
            | TextEncoding::Windows1252 => 1,
            TextEncoding::Utf16Le
            | TextEncoding::Utf16Be
            | TextEncoding::Ucs2Le
            | TextEncoding::Ucs2Be => 2,
            TextEncoding::Utf32Le
            | TextEncoding::Utf32Be
            | TextEncoding::Ucs4Le
            | TextEncoding::Ucs4Be => 4,
        }
    }

    /// Whether one code unit is one byte.
    #[inline]
    pub const fn is_single_byte(self) -> bool {
        self.unit_width() == 1
    }

    /// Whether multi-byte units are stored least significant byte first.
    #[inline]
    pub const fn is_little_endian(self) -> bool {
        matches!(
            self,
            TextEncoding::Utf16Le | TextEncoding::Utf32Le | TextEncoding::Ucs2Le | TextEncoding::Ucs4Le
        )
    }

    /// Assembles one code unit from exactly `unit_width()` bytes.
    #[inline]
    pub fn assemble_unit(self, bytes: &[u8]) -> u32 {
        if self.is_little_endian() {
            bytes.iter().rev().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
        } else {
            bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
        }
    }

    /// Persistence identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            TextEncoding::Unknown => "unknown",
            TextEncoding::Latin1 => "Latin1",
            TextEncoding::Utf8 => "UTF8",
            TextEncoding::Utf16Le => "UTF16LE",
            TextEncoding::Utf16Be => "UTF16BE",
            TextEncoding::Utf32Le => "UTF32LE",
            TextEncoding::Utf32Be => "UTF32BE",
            TextEncoding::Ucs2Le => "UCS2LE",
            TextEncoding::Ucs2Be => "UCS2BE",
            TextEncoding::Ucs4Le => "UCS4LE",
            TextEncoding::Ucs4Be => "UCS4BE",
            TextEncoding::Windows1252 => "windows_1252",
        }
    }

    /// Parses a persistence identifier, case-insensitively.
    pub fn from_name(name: &str) -> Option<TextEncoding> {
        ALL_ENCODINGS
            .iter()
            .copied()
            .find(|encoding| encoding.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper half (0x80..=0xFF) of Windows-1252, taken from `encoding_rs`.
static WINDOWS_1252_HIGH: Lazy<[char; 128]> = Lazy::new(|| {
    let bytes: Vec<u8> = (0x80..=0xFFu8).collect();
    let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(&bytes);
    let mut table = [REPLACEMENT_CHARACTER; 128];
    for (slot, ch) in table.iter_mut().zip(text.chars()) {
        *slot = ch;
    }
    table
});

/// Decodes one Windows-1252 byte.
#[inline]
pub fn windows_1252_char(byte: u8) -> char {
    if byte < 0x80 {
        char::from(byte)
    } else {
        WINDOWS_1252_HIGH[usize::from(byte - 0x80)]
    }
}

/// A source of code units with one unit of pushback.
pub trait UnitStream {
    /// Returns the next code unit, or `None` at end of input.
    fn next_unit(&mut self) -> Result<Option<u32>>;

    /// Pushes `unit` back so that the next call to `next_unit` returns it.
    fn unread_unit(&mut self, unit: u32);
}

/// Decodes the next full code point from `stream`.
///
/// Invalid or truncated sequences yield U+FFFD. A unit that breaks a
/// sequence is pushed back and starts the next character.
pub fn decode_next<S: UnitStream + ?Sized>(
    encoding: TextEncoding,
    stream: &mut S,
) -> Result<Option<char>> {
    let Some(unit) = stream.next_unit()? else {
        return Ok(None);
    };

    let decoded = match encoding {
        TextEncoding::Unknown | TextEncoding::Utf8 => decode_utf8(unit, stream)?,
        TextEncoding::Windows1252 => Some(windows_1252_char(unit as u8)),
        TextEncoding::Utf16Le | TextEncoding::Utf16Be => decode_utf16(unit, stream)?,
        TextEncoding::Latin1
        | TextEncoding::Ucs2Le
        | TextEncoding::Ucs2Be
        | TextEncoding::Utf32Le
        | TextEncoding::Utf32Be
        | TextEncoding::Ucs4Le
        | TextEncoding::Ucs4Be => char::from_u32(unit),
    };

    Ok(Some(decoded.unwrap_or(REPLACEMENT_CHARACTER)))
}

fn decode_utf8<S: UnitStream + ?Sized>(lead: u32, stream: &mut S) -> Result<Option<char>> {
    let (len, mut code_point) = match lead {
        0x00..=0x7F => return Ok(char::from_u32(lead)),
        0xC2..=0xDF => (2, lead & 0x1F),
        0xE0..=0xEF => (3, lead & 0x0F),
        0xF0..=0xF4 => (4, lead & 0x07),
        _ => return Ok(None),
    };

    for _ in 1..len {
        match stream.next_unit()? {
            Some(unit) if unit & 0xC0 == 0x80 => code_point = (code_point << 6) | (unit & 0x3F),
            Some(unit) => {
                stream.unread_unit(unit);
                return Ok(None);
            },
            None => return Ok(None),
        }
    }

    // Overlong forms
    let minimum = match len {
        2 => 0x80,
        3 => 0x800,
        _ => 0x1_0000,
    };
    if code_point < minimum {
        return Ok(None);
    }

    Ok(char::from_u32(code_point))
}

fn decode_utf16<S: UnitStream + ?Sized>(unit: u32, stream: &mut S) -> Result<Option<char>> {
    match unit {
        0xD800..=0xDBFF => match stream.next_unit()? {
            Some(low @ 0xDC00..=0xDFFF) => {
                Ok(char::from_u32(0x1_0000 + ((unit - 0xD800) << 10) + (low - 0xDC00)))
            },
            Some(other) => {
                stream.unread_unit(other);
                Ok(None)
            },
            None => Ok(None),
        },
        0xDC00..=0xDFFF => Ok(None),
        _ => Ok(char::from_u32(unit)),
    }
}

/// Decodes bytes of a single-byte encoding, borrowing when possible.
pub fn decode_single_byte(encoding: TextEncoding, bytes: &[u8]) -> Cow<'_, str> {
    match encoding {
        TextEncoding::Windows1252 => encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes).0,
        TextEncoding::Latin1 => match std::str::from_utf8(bytes) {
            Ok(text) if bytes.is_ascii() => Cow::Borrowed(text),
            _ => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
        },
        _ => String::from_utf8_lossy(bytes),
    }
}

/// Appends the encoded form of `ch` to `out`.
///
/// Characters the encoding cannot represent are written as `?`.
pub fn encode_char(encoding: TextEncoding, ch: char, out: &mut Vec<u8>) {
    let mut utf16 = [0u16; 2];
    match encoding {
        TextEncoding::Unknown | TextEncoding::Utf8 => {
            let mut utf8 = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
        },
        TextEncoding::Latin1 => out.push(u8::try_from(u32::from(ch)).unwrap_or(b'?')),
        TextEncoding::Windows1252 => {
            let byte = if ch.is_ascii() {
                ch as u8
            } else {
                WINDOWS_1252_HIGH
                    .iter()
                    .position(|&c| c == ch)
                    .map_or(b'?', |pos| 0x80 + pos as u8)
            };
            out.push(byte);
        },
        TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
            for unit in ch.encode_utf16(&mut utf16).iter() {
                push_unit(encoding, u32::from(*unit), out);
            }
        },
        TextEncoding::Ucs2Le | TextEncoding::Ucs2Be => {
            let unit = if u32::from(ch) <= 0xFFFF { u32::from(ch) } else { u32::from(b'?') };
            push_unit(encoding, unit, out);
        },
        TextEncoding::Utf32Le
        | TextEncoding::Utf32Be
        | TextEncoding::Ucs4Le
        | TextEncoding::Ucs4Be => push_unit(encoding, u32::from(ch), out),
    }
}

/// Appends the encoded form of every character of `text` to `out`.
pub fn encode_str(encoding: TextEncoding, text: &str, out: &mut Vec<u8>) {
    if matches!(encoding, TextEncoding::Unknown | TextEncoding::Utf8) {
        out.extend_from_slice(text.as_bytes());
        return;
    }
    for ch in text.chars() {
        encode_char(encoding, ch, out);
    }
}

fn push_unit(encoding: TextEncoding, unit: u32, out: &mut Vec<u8>) {
    let width = encoding.unit_width();
    let bytes = unit.to_be_bytes();
    let significant = &bytes[4 - width..];
    if encoding.is_little_endian() {
        out.extend(significant.iter().rev());
    } else {
        out.extend_from_slice(significant);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Units {
        units: Vec<u32>,
        pos: usize,
        pushed: Option<u32>,
    }

    impl Units {
        fn new(units: &[u32]) -> Self {
            Units {
                units: units.to_vec(),
                pos: 0,
                pushed: None,
            }
        }
    }

    impl UnitStream for Units {
        fn next_unit(&mut self) -> Result<Option<u32>> {
            if let Some(unit) = self.pushed.take() {
                return Ok(Some(unit));
            }
            let unit = self.units.get(self.pos).copied();
            self.pos += 1;
            Ok(unit)
        }

        fn unread_unit(&mut self, unit: u32) {
            self.pushed = Some(unit);
        }
    }

    fn decode_all(encoding: TextEncoding, units: &[u32]) -> String {
        let mut stream = Units::new(units);
        let mut out = String::new();
        while let Some(ch) = decode_next(encoding, &mut stream).unwrap() {
            out.push(ch);
        }
        out
    }

    #[test]
    fn test_decode_utf8_sequences() {
        let units: Vec<u32> = "aé€😀".bytes().map(u32::from).collect();
        assert_eq!(decode_all(TextEncoding::Utf8, &units), "aé€😀");
    }

    #[test]
    fn test_decode_utf8_broken_sequence_keeps_next_char() {
        // 0xC3 expects a continuation byte; 'a' must survive.
        assert_eq!(decode_all(TextEncoding::Utf8, &[0xC3, u32::from(b'a')]), "\u{FFFD}a");
        // Overlong encoding of '/'.
        assert_eq!(decode_all(TextEncoding::Utf8, &[0xC0, 0xAF]), "\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn test_decode_utf16_surrogates() {
        assert_eq!(decode_all(TextEncoding::Utf16Le, &[0xD83D, 0xDE00, 0x41]), "😀A");
        assert_eq!(decode_all(TextEncoding::Utf16Be, &[0xD83D, 0x41]), "\u{FFFD}A");
        assert_eq!(decode_all(TextEncoding::Utf16Be, &[0xDE00]), "\u{FFFD}");
    }

    #[test]
    fn test_decode_windows_1252() {
        assert_eq!(decode_all(TextEncoding::Windows1252, &[0x80, 0x41, 0xE9]), "€Aé");
        assert_eq!(decode_all(TextEncoding::Latin1, &[0x80, 0xE9]), "\u{80}é");
    }

    #[test]
    fn test_assemble_unit() {
        assert_eq!(TextEncoding::Utf16Le.assemble_unit(&[0x41, 0x00]), 0x41);
        assert_eq!(TextEncoding::Utf16Be.assemble_unit(&[0x00, 0x41]), 0x41);
        assert_eq!(TextEncoding::Utf32Le.assemble_unit(&[0x00, 0xF6, 0x01, 0x00]), 0x1F600);
    }

    #[test]
    fn test_encode_round_trip() {
        let mut out = Vec::new();
        encode_str(TextEncoding::Utf16Be, "A😀", &mut out);
        assert_eq!(out, vec![0x00, 0x41, 0xD8, 0x3D, 0xDE, 0x00]);

        out.clear();
        encode_str(TextEncoding::Windows1252, "€é☃", &mut out);
        assert_eq!(out, vec![0x80, 0xE9, b'?']);

        out.clear();
        encode_str(TextEncoding::Latin1, "é€", &mut out);
        assert_eq!(out, vec![0xE9, b'?']);

        out.clear();
        encode_str(TextEncoding::Ucs4Le, "A", &mut out);
        assert_eq!(out, vec![0x41, 0, 0, 0]);
    }

    #[test]
    fn test_encoding_names() {
        for encoding in ALL_ENCODINGS {
            assert_eq!(TextEncoding::from_name(encoding.as_str()), Some(encoding));
        }
        assert_eq!(TextEncoding::from_name("utf8"), Some(TextEncoding::Utf8));
        assert_eq!(TextEncoding::from_name("EBCDIC"), None);
    }

    #[test]
    fn test_decode_single_byte_borrows_ascii() {
        assert!(matches!(decode_single_byte(TextEncoding::Latin1, b"abc"), Cow::Borrowed("abc")));
        assert_eq!(decode_single_byte(TextEncoding::Latin1, &[0xE9]), "é");
        assert_eq!(decode_single_byte(TextEncoding::Windows1252, &[0x80]), "€");
    }
}
