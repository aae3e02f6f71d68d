//! Format definition for delimited text.
//!
//! A [`FormatDefinition`] describes the separator, enclosing and
//! end-of-line characters of a delimited file. Each of them is either a
//! concrete character or one of two meta values: [`FormatChar::None`]
//! (the feature is disabled) or [`FormatChar::Auto`] (resolved from the
//! input during the read).

use crate::common::TextEncoding;
use bitflags::bitflags;
use std::collections::BTreeMap;

/// Characters that separator auto-detection accepts, in no particular priority.
///
/// The first of them seen outside an enclosed cell becomes the separator.
pub const SEPARATOR_CANDIDATES: [char; 4] = [',', ';', '\t', '\u{1F}'];

/// A separator, enclosing or end-of-line setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatChar {
    /// A concrete character
    Char(char),
    /// Disabled
    None,
    /// Resolved from the first matching character in the input
    Auto,
}

impl FormatChar {
    /// The concrete character, if any.
    #[inline]
    pub const fn as_char(self) -> Option<char> {
        match self {
            FormatChar::Char(ch) => Some(ch),
            FormatChar::None | FormatChar::Auto => None,
        }
    }

    #[inline]
    pub const fn is_auto(self) -> bool {
        matches!(self, FormatChar::Auto)
    }

    /// Whether this setting is the concrete character `ch`.
    #[inline]
    pub fn is(self, ch: char) -> bool {
        self == FormatChar::Char(ch)
    }
}

impl From<char> for FormatChar {
    fn from(ch: char) -> Self {
        FormatChar::Char(ch)
    }
}

impl From<Option<char>> for FormatChar {
    fn from(ch: Option<char>) -> Self {
        ch.map_or(FormatChar::None, FormatChar::Char)
    }
}

bitflags! {
    /// Reading behaviour switches of a format.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FormatFlags: u8 {
        /// Drop whitespace at the start of every cell
        const SKIP_LEADING_WHITESPACE = 0x01;
        /// Keep `\r` in `\r\n` instead of reading the pair as one `\n`
        const NO_RN_FOLDING = 0x02;
    }
}

/// Line ending written between rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EndOfLineType {
    /// `\n`
    #[default]
    N,
    /// `\r\n`
    RN,
    /// `\r`
    R,
}

impl EndOfLineType {
    /// The written sequence.
    pub const fn as_str(self) -> &'static str {
        match self {
            EndOfLineType::N => "\n",
            EndOfLineType::RN => "\r\n",
            EndOfLineType::R => "\r",
        }
    }

    /// The character the reader treats as end of line for this type.
    ///
    /// `\r\n` is read as `\n` through `\r\n` folding.
    pub const fn read_char(self) -> char {
        match self {
            EndOfLineType::N | EndOfLineType::RN => '\n',
            EndOfLineType::R => '\r',
        }
    }

    /// Persistence identifier.
    pub const fn id(self) -> &'static str {
        match self {
            EndOfLineType::N => "n",
            EndOfLineType::RN => "rn",
            EndOfLineType::R => "r",
        }
    }

    /// Parses a persistence identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "n" => Some(EndOfLineType::N),
            "rn" => Some(EndOfLineType::RN),
            "r" => Some(EndOfLineType::R),
            _ => None,
        }
    }
}

/// Description of a delimited text format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDefinition {
    /// Cell separator
    pub separator: FormatChar,
    /// Enclosing (quote) character
    pub enclosing: FormatChar,
    /// End-of-line character used when reading
    pub eol: FormatChar,
    /// Reading switches
    pub flags: FormatFlags,
    /// Line ending used when writing
    pub eol_type: EndOfLineType,
    /// Text encoding, [`TextEncoding::Unknown`] for BOM detection
    pub encoding: TextEncoding,
    /// Whether the writer emits a byte order mark
    pub bom_writing: bool,
    /// Implementation-specific extensions, persisted under `properties/`
    pub properties: BTreeMap<String, String>,
}

impl Default for FormatDefinition {
    fn default() -> Self {
        Self::fixed(',', Some('"'), '\n')
    }
}

impl FormatDefinition {
    /// Create a new default (comma separated) definition
    pub fn new() -> Self {
        Self::default()
    }

    /// A definition with concrete characters only.
    ///
    /// Auto-detection cannot be expressed here, which makes it usable for
    /// formats fixed at compile time.
    pub const fn fixed(separator: char, enclosing: Option<char>, eol: char) -> Self {
        let enclosing = match enclosing {
            Some(ch) => FormatChar::Char(ch),
            None => FormatChar::None,
        };
        let eol_type = if eol == '\r' { EndOfLineType::R } else { EndOfLineType::N };
        Self {
            separator: FormatChar::Char(separator),
            enclosing,
            eol: FormatChar::Char(eol),
            flags: FormatFlags::empty(),
            eol_type,
            encoding: TextEncoding::Unknown,
            bom_writing: false,
            properties: BTreeMap::new(),
        }
    }

    /// Comma separated values
    pub fn csv() -> Self {
        Self::default()
    }

    /// Tab separated values
    pub fn tsv() -> Self {
        Self::fixed('\t', Some('"'), '\n')
    }

    /// Semicolon separated values
    pub fn semicolon() -> Self {
        Self::fixed(';', Some('"'), '\n')
    }

    /// Set the separator
    pub fn with_separator(mut self, separator: impl Into<FormatChar>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the enclosing character
    pub fn with_enclosing(mut self, enclosing: impl Into<FormatChar>) -> Self {
        self.enclosing = enclosing.into();
        self
    }

    /// Set the end-of-line character used when reading
    pub fn with_eol(mut self, eol: impl Into<FormatChar>) -> Self {
        self.eol = eol.into();
        self
    }

    /// Set the written line ending; the read end-of-line character follows it
    pub fn with_eol_type(mut self, eol_type: EndOfLineType) -> Self {
        self.eol_type = eol_type;
        self.eol = FormatChar::Char(eol_type.read_char());
        self
    }

    /// Enable/disable leading whitespace trimming
    pub fn with_skip_leading_whitespace(mut self, skip: bool) -> Self {
        self.flags.set(FormatFlags::SKIP_LEADING_WHITESPACE, skip);
        self
    }

    /// Enable/disable `\r\n` to `\n` folding
    pub fn with_rn_folding(mut self, fold: bool) -> Self {
        self.flags.set(FormatFlags::NO_RN_FOLDING, !fold);
        self
    }

    /// Set the text encoding
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Enable/disable BOM writing
    pub fn with_bom_writing(mut self, bom: bool) -> Self {
        self.bom_writing = bom;
        self
    }

    /// Set an implementation-specific property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn skip_leading_whitespace(&self) -> bool {
        self.flags.contains(FormatFlags::SKIP_LEADING_WHITESPACE)
    }

    /// Whether `\r\n` is read as `\n`. Only applies when the eol is `\n` or auto.
    #[inline]
    pub fn rn_folding(&self) -> bool {
        !self.flags.contains(FormatFlags::NO_RN_FOLDING)
            && matches!(self.eol, FormatChar::Char('\n') | FormatChar::Auto)
    }

    /// Whether any setting asks for auto-detection.
    pub fn has_auto(&self) -> bool {
        self.separator.is_auto() || self.enclosing.is_auto() || self.eol.is_auto()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIPE: FormatDefinition = FormatDefinition::fixed('|', None, '\n');

    #[test]
    fn test_fixed_format() {
        assert_eq!(PIPE.separator, FormatChar::Char('|'));
        assert_eq!(PIPE.enclosing, FormatChar::None);
        assert!(!PIPE.has_auto());
        assert!(PIPE.rn_folding());
    }

    #[test]
    fn test_builders() {
        let format = FormatDefinition::new()
            .with_separator(FormatChar::Auto)
            .with_enclosing(FormatChar::None)
            .with_eol_type(EndOfLineType::R)
            .with_skip_leading_whitespace(true);
        assert!(format.separator.is_auto());
        assert_eq!(format.enclosing, FormatChar::None);
        assert_eq!(format.eol, FormatChar::Char('\r'));
        assert!(format.skip_leading_whitespace());
        // Folding is meaningless with a `\r` end of line.
        assert!(!format.rn_folding());
        assert!(format.has_auto());
    }

    #[test]
    fn test_rn_folding_flag() {
        let format = FormatDefinition::csv().with_rn_folding(false);
        assert!(!format.rn_folding());
        assert!(format.with_rn_folding(true).rn_folding());
    }

    #[test]
    fn test_eol_type_ids() {
        for eol in [EndOfLineType::N, EndOfLineType::RN, EndOfLineType::R] {
            assert_eq!(EndOfLineType::from_id(eol.id()), Some(eol));
        }
        assert_eq!(EndOfLineType::from_id("crlf"), None);
        assert_eq!(EndOfLineType::RN.read_char(), '\n');
    }
}
