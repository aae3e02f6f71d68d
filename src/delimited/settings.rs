//! Persistence of [`FormatDefinition`] as string key/value settings.
//!
//! Keys:
//!
//! | key                | value                                        |
//! |--------------------|----------------------------------------------|
//! | `separator_char`   | escaped character, `""` for none, `auto`     |
//! | `enclosing_char`   | escaped character, `""` for none, `auto`     |
//! | `end_of_line_type` | `n`, `rn` or `r`                             |
//! | `encoding`         | encoding name such as `UTF8` or `UTF16LE`    |
//! | `bom_writing`      | `true` / `false`                             |
//! | `properties/<key>` | free-form extension values                   |
//!
//! Characters are written as `\xHH`, or `\x{HHHH}` above 0xFF. Loading also
//! accepts `\t`, `\n`, `\r`, `\\`, `\0`, `\uHHHH` and single literal
//! characters.

use super::format::{EndOfLineType, FormatChar, FormatDefinition};
use crate::common::{Error, Result, TextEncoding};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SEPARATOR_KEY: &str = "separator_char";
pub const ENCLOSING_KEY: &str = "enclosing_char";
pub const END_OF_LINE_TYPE_KEY: &str = "end_of_line_type";
pub const ENCODING_KEY: &str = "encoding";
pub const BOM_WRITING_KEY: &str = "bom_writing";
/// Prefix of extension property keys.
pub const PROPERTIES_PREFIX: &str = "properties/";

const AUTO: &str = "auto";

/// Raw persisted settings. Absent fields leave the format unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSettings {
    #[serde(rename = "separator_char", default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    #[serde(rename = "enclosing_char", default, skip_serializing_if = "Option::is_none")]
    pub enclosing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_of_line_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bom_writing: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl FormatSettings {
    /// Picks the known keys out of a flat string map.
    ///
    /// Unknown keys are ignored; `properties/<key>` entries are collected
    /// without their prefix.
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let mut settings = Self::default();
        for (key, value) in map {
            let slot = match key.as_str() {
                SEPARATOR_KEY => &mut settings.separator,
                ENCLOSING_KEY => &mut settings.enclosing,
                END_OF_LINE_TYPE_KEY => &mut settings.end_of_line_type,
                ENCODING_KEY => &mut settings.encoding,
                BOM_WRITING_KEY => &mut settings.bom_writing,
                other => {
                    if let Some(name) = other.strip_prefix(PROPERTIES_PREFIX) {
                        settings.properties.insert(name.to_string(), value.clone());
                    }
                    continue;
                },
            };
            *slot = Some(value.clone());
        }
        settings
    }

    /// Flattens back into a string map.
    pub fn into_map(self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        let fields = [
            (SEPARATOR_KEY, self.separator),
            (ENCLOSING_KEY, self.enclosing),
            (END_OF_LINE_TYPE_KEY, self.end_of_line_type),
            (ENCODING_KEY, self.encoding),
            (BOM_WRITING_KEY, self.bom_writing),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                map.insert(key.to_string(), value);
            }
        }
        for (name, value) in self.properties {
            map.insert(format!("{PROPERTIES_PREFIX}{name}"), value);
        }
        map
    }

    /// Captures every persisted field of `format`.
    pub fn from_format(format: &FormatDefinition) -> Self {
        Self {
            separator: Some(format_char_setting(format.separator)),
            enclosing: Some(format_char_setting(format.enclosing)),
            end_of_line_type: Some(format.eol_type.id().to_string()),
            encoding: Some(format.encoding.as_str().to_string()),
            bom_writing: Some(format.bom_writing.to_string()),
            properties: format.properties.clone(),
        }
    }

    /// Applies the present fields to `format`.
    ///
    /// Every value is validated before `format` is touched, so a failed
    /// apply leaves it unchanged.
    pub fn apply_to(&self, format: &mut FormatDefinition) -> Result<()> {
        let separator = self
            .separator
            .as_deref()
            .map(|value| parse_format_char(value).ok_or_else(|| Error::invalid_setting(SEPARATOR_KEY, value)))
            .transpose()?;
        let enclosing = self
            .enclosing
            .as_deref()
            .map(|value| parse_format_char(value).ok_or_else(|| Error::invalid_setting(ENCLOSING_KEY, value)))
            .transpose()?;
        let eol_type = self
            .end_of_line_type
            .as_deref()
            .map(|value| {
                EndOfLineType::from_id(value).ok_or_else(|| Error::invalid_setting(END_OF_LINE_TYPE_KEY, value))
            })
            .transpose()?;
        let encoding = self
            .encoding
            .as_deref()
            .map(|value| TextEncoding::from_name(value).ok_or_else(|| Error::invalid_setting(ENCODING_KEY, value)))
            .transpose()?;
        let bom_writing = self
            .bom_writing
            .as_deref()
            .map(|value| parse_bool(value).ok_or_else(|| Error::invalid_setting(BOM_WRITING_KEY, value)))
            .transpose()?;

        if let Some(separator) = separator {
            format.separator = separator;
        }
        if let Some(enclosing) = enclosing {
            format.enclosing = enclosing;
        }
        if let Some(eol_type) = eol_type {
            format.eol_type = eol_type;
            format.eol = FormatChar::Char(eol_type.read_char());
        }
        if let Some(encoding) = encoding {
            format.encoding = encoding;
        }
        if let Some(bom_writing) = bom_writing {
            format.bom_writing = bom_writing;
        }
        for (name, value) in &self.properties {
            format.properties.insert(name.clone(), value.clone());
        }
        Ok(())
    }
}

impl FormatDefinition {
    /// Persisted form of this format.
    pub fn to_settings(&self) -> BTreeMap<String, String> {
        FormatSettings::from_format(self).into_map()
    }

    /// Loads persisted settings on top of the current values.
    ///
    /// Keys missing from `map` keep their current value.
    pub fn apply_settings(&mut self, map: &BTreeMap<String, String>) -> Result<()> {
        FormatSettings::from_map(map).apply_to(self)
    }

    /// A default format with `map` applied.
    pub fn from_settings(map: &BTreeMap<String, String>) -> Result<Self> {
        let mut format = Self::default();
        format.apply_settings(map)?;
        Ok(format)
    }
}

/// Escaped form of a single character.
pub fn escape_char(ch: char) -> String {
    let code = u32::from(ch);
    if code <= 0xFF {
        format!("\\x{code:02X}")
    } else {
        format!("\\x{{{code:X}}}")
    }
}

/// Parses a single escaped or literal character.
pub fn unescape_char(value: &str) -> Option<char> {
    let mut chars = value.chars();
    let first = chars.next()?;
    if first != '\\' {
        return chars.next().is_none().then_some(first);
    }

    let rest = chars.as_str();
    match rest {
        "t" => return Some('\t'),
        "n" => return Some('\n'),
        "r" => return Some('\r'),
        "\\" => return Some('\\'),
        "0" => return Some('\0'),
        _ => {},
    }

    let hex = if let Some(braced) = rest.strip_prefix("x{") {
        let digits = braced.strip_suffix('}')?;
        (1..=6).contains(&digits.len()).then_some(digits)?
    } else if let Some(digits) = rest.strip_prefix('x') {
        (digits.len() == 2).then_some(digits)?
    } else if let Some(digits) = rest.strip_prefix('u') {
        (digits.len() == 4).then_some(digits)?
    } else {
        return None;
    };

    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

fn format_char_setting(ch: FormatChar) -> String {
    match ch {
        FormatChar::Char(ch) => escape_char(ch),
        FormatChar::None => String::new(),
        FormatChar::Auto => AUTO.to_string(),
    }
}

fn parse_format_char(value: &str) -> Option<FormatChar> {
    match value {
        "" => Some(FormatChar::None),
        AUTO => Some(FormatChar::Auto),
        other => unescape_char(other).map(FormatChar::Char),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
