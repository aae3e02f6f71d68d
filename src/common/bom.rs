//! Byte Order Mark (BOM) utilities shared across modules.
//!
//! Provides detection and writing helpers for the Unicode encodings the
//! delimited reader understands. UTF-32 markers are checked before UTF-16
//! because `FF FE 00 00` starts with the UTF-16LE marker.

use crate::common::Result;
use crate::common::encoding::TextEncoding;
use std::io::Write;

/// Supported BOM encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BomKind {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl BomKind {
    /// Returns the byte representation of the BOM.
    #[inline]
    pub const fn as_bytes(&self) -> &'static [u8] {
        match self {
            BomKind::Utf8 => &UTF8_BOM,
            BomKind::Utf16Le => &UTF16_LE_BOM,
            BomKind::Utf16Be => &UTF16_BE_BOM,
            BomKind::Utf32Le => &UTF32_LE_BOM,
            BomKind::Utf32Be => &UTF32_BE_BOM,
        }
    }

    /// Returns the length in bytes of the BOM.
    #[inline]
    #[allow(clippy::len_without_is_empty)] // No need to check for empty BOMs
    pub const fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Encoding announced by this marker.
    pub const fn encoding(&self) -> TextEncoding {
        match self {
            BomKind::Utf8 => TextEncoding::Utf8,
            BomKind::Utf16Le => TextEncoding::Utf16Le,
            BomKind::Utf16Be => TextEncoding::Utf16Be,
            BomKind::Utf32Le => TextEncoding::Utf32Le,
            BomKind::Utf32Be => TextEncoding::Utf32Be,
        }
    }

    /// Marker written for `encoding`, if that encoding has one.
    ///
    /// UCS-2/UCS-4 share the UTF-16/UTF-32 markers.
    pub const fn for_encoding(encoding: TextEncoding) -> Option<BomKind> {
        match encoding {
            TextEncoding::Utf8 => Some(BomKind::Utf8),
            TextEncoding::Utf16Le | TextEncoding::Ucs2Le => Some(BomKind::Utf16Le),
            TextEncoding::Utf16Be | TextEncoding::Ucs2Be => Some(BomKind::Utf16Be),
            TextEncoding::Utf32Le | TextEncoding::Ucs4Le => Some(BomKind::Utf32Le),
            TextEncoding::Utf32Be | TextEncoding::Ucs4Be => Some(BomKind::Utf32Be),
            TextEncoding::Unknown | TextEncoding::Latin1 | TextEncoding::Windows1252 => None,
        }
    }
}

/// UTF-8 BOM bytes.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
/// UTF-16 little-endian BOM bytes.
pub const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];
/// UTF-16 big-endian BOM bytes.
pub const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];
/// UTF-32 little-endian BOM bytes.
pub const UTF32_LE_BOM: [u8; 4] = [0xFF, 0xFE, 0x00, 0x00];
/// UTF-32 big-endian BOM bytes.
pub const UTF32_BE_BOM: [u8; 4] = [0x00, 0x00, 0xFE, 0xFF];

/// Writes the requested BOM to the writer.
pub fn write_bom<W: Write>(writer: &mut W, kind: BomKind) -> Result<()> {
    writer.write_all(kind.as_bytes())?;
    Ok(())
}

/// Detects a BOM at the start of `buf`.
///
/// `buf` may be shorter than four bytes; only markers that fit are checked.
pub fn detect_bom(buf: &[u8]) -> Option<BomKind> {
    if buf.starts_with(&UTF32_BE_BOM) {
        return Some(BomKind::Utf32Be);
    }
    if buf.starts_with(&UTF32_LE_BOM) {
        return Some(BomKind::Utf32Le);
    }
    if buf.starts_with(&UTF8_BOM) {
        return Some(BomKind::Utf8);
    }
    if buf.starts_with(&UTF16_BE_BOM) {
        return Some(BomKind::Utf16Be);
    }
    if buf.starts_with(&UTF16_LE_BOM) {
        return Some(BomKind::Utf16Le);
    }

    None
}

/// Decides the effective encoding of an input that starts with `prefix`.
///
/// Returns the encoding to decode with and the number of marker bytes to
/// skip. With [`TextEncoding::Unknown`] the marker decides and UTF-8 is the
/// fallback; with a fixed encoding a marker is only skipped when it agrees.
pub fn resolve_encoding(requested: TextEncoding, prefix: &[u8]) -> (TextEncoding, usize) {
    let detected = detect_bom(prefix);
    match (requested, detected) {
        (TextEncoding::Unknown, Some(kind)) => (kind.encoding(), kind.len()),
        (TextEncoding::Unknown, None) => (TextEncoding::Utf8, 0),
        (fixed, Some(kind)) if BomKind::for_encoding(fixed) == Some(kind) => (fixed, kind.len()),
        (fixed, _) => (fixed, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_utf32_before_utf16() {
        assert_eq!(detect_bom(&[0xFF, 0xFE, 0x00, 0x00, b'a']), Some(BomKind::Utf32Le));
        assert_eq!(detect_bom(&[0xFF, 0xFE, b'a', 0x00]), Some(BomKind::Utf16Le));
        assert_eq!(detect_bom(&[0x00, 0x00, 0xFE, 0xFF]), Some(BomKind::Utf32Be));
        assert_eq!(detect_bom(&[0xFE, 0xFF]), Some(BomKind::Utf16Be));
        assert_eq!(detect_bom(&[0xEF, 0xBB, 0xBF, b'x']), Some(BomKind::Utf8));
        assert_eq!(detect_bom(b"abc"), None);
        assert_eq!(detect_bom(&[]), None);
    }

    #[test]
    fn test_resolve_encoding() {
        assert_eq!(resolve_encoding(TextEncoding::Unknown, b"a,b"), (TextEncoding::Utf8, 0));
        assert_eq!(
            resolve_encoding(TextEncoding::Unknown, &UTF16_BE_BOM),
            (TextEncoding::Utf16Be, 2)
        );
        // Fixed encoding wins; a matching marker is skipped.
        assert_eq!(resolve_encoding(TextEncoding::Utf8, &UTF8_BOM), (TextEncoding::Utf8, 3));
        assert_eq!(resolve_encoding(TextEncoding::Latin1, &UTF8_BOM), (TextEncoding::Latin1, 0));
        assert_eq!(
            resolve_encoding(TextEncoding::Ucs2Le, &UTF16_LE_BOM),
            (TextEncoding::Ucs2Le, 2)
        );
    }

    #[test]
    fn test_write_bom() {
        let mut out = Vec::new();
        write_bom(&mut out, BomKind::Utf16Le).unwrap();
        assert_eq!(out, vec![0xFF, 0xFE]);
    }
}
