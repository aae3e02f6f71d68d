//! Delimited text writer for [`TableSz`].

use super::format::FormatDefinition;
use crate::common::bom::{BomKind, write_bom};
use crate::common::encoding::encode_str;
use crate::common::{Error, Result, TextEncoding};
use crate::table::TableSz;
use std::io::Write;

/// When cells are wrapped in the enclosing character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnclosementPolicy {
    /// Never; content is written as is
    Never,
    /// Only cells containing the separator, the enclosing character, a line break
    /// or the read end-of-line character
    #[default]
    IfNeeded,
    /// Every cell, empty ones included
    Always,
}

/// Whether `cell` must be enclosed to survive a round trip through `format`.
pub fn needs_enclosing(cell: &str, format: &FormatDefinition) -> bool {
    cell.chars().any(|ch| {
        ch == '\n'
            || ch == '\r'
            || format.separator.is(ch)
            || format.enclosing.is(ch)
            || format.eol.is(ch)
    })
}

/// Appends `cell` to `out`, enclosed when `policy` asks for it.
///
/// Enclosing characters inside an enclosed cell are doubled.
pub fn write_cell(out: &mut String, cell: &str, format: &FormatDefinition, policy: EnclosementPolicy) {
    let enclose = match (format.enclosing.as_char(), policy) {
        (None, _) | (_, EnclosementPolicy::Never) => None,
        (Some(enclosing), EnclosementPolicy::Always) => Some(enclosing),
        (Some(enclosing), EnclosementPolicy::IfNeeded) => {
            needs_enclosing(cell, format).then_some(enclosing)
        },
    };

    let Some(enclosing) = enclose else {
        out.push_str(cell);
        return;
    };

    out.push(enclosing);
    for ch in cell.chars() {
        if ch == enclosing {
            out.push(enclosing);
        }
        out.push(ch);
    }
    out.push(enclosing);
}

/// Writes `table` as delimited text.
///
/// Rows are written in ascending order of the row indices present in any
/// column; rows missing from every column are not written. Every written
/// row has `col_count()` cells, empty where a column has no entry. The
/// line ending goes between rows, not after the last one.
pub fn write_table<W: Write>(
    table: &TableSz,
    writer: &mut W,
    format: &FormatDefinition,
    policy: EnclosementPolicy,
) -> Result<()> {
    let Some(separator) = format.separator.as_char() else {
        return Err(Error::InvalidFormat(
            "writing requires a concrete separator".to_string(),
        ));
    };
    if format.enclosing.is_auto() {
        return Err(Error::InvalidFormat(
            "writing requires a concrete or disabled enclosing character".to_string(),
        ));
    }

    // Unknown is written as UTF-8
    let encoding = match format.encoding {
        TextEncoding::Unknown => TextEncoding::Utf8,
        other => other,
    };
    if format.bom_writing {
        if let Some(bom) = BomKind::for_encoding(encoding) {
            write_bom(writer, bom)?;
        }
    }

    let col_count = table.col_count();
    let mut line = String::new();
    let mut bytes = Vec::new();

    for (i, row) in table.row_indices().into_iter().enumerate() {
        line.clear();
        if i > 0 {
            line.push_str(format.eol_type.as_str());
        }
        for col in 0..col_count {
            if col > 0 {
                line.push(separator);
            }
            write_cell(&mut line, table.get(row, col).unwrap_or(""), format, policy);
        }

        bytes.clear();
        encode_str(encoding, &line, &mut bytes);
        writer.write_all(&bytes)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delimited::format::EndOfLineType;

    fn table(rows: &[&[&str]]) -> TableSz {
        let mut table = TableSz::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                assert!(table.add_string(cell, r, c));
            }
        }
        table
    }

    fn written(table: &TableSz, format: &FormatDefinition, policy: EnclosementPolicy) -> Vec<u8> {
        let mut out = Vec::new();
        write_table(table, &mut out, format, policy).unwrap();
        out
    }

    #[test]
    fn test_enclose_if_needed() {
        let table = table(&[&["plain", "a,b", "say \"hi\""], &["line\nbreak", "", "x"]]);
        let out = written(&table, &FormatDefinition::csv(), EnclosementPolicy::IfNeeded);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "plain,\"a,b\",\"say \"\"hi\"\"\"\n\"line\nbreak\",,x"
        );
    }

    #[test]
    fn test_enclose_custom_eol_char() {
        let table = table(&[&["a|b", "c"]]);
        let format = FormatDefinition::csv().with_eol('|');
        assert!(needs_enclosing("a|b", &format));
        assert!(!needs_enclosing("a|b", &FormatDefinition::csv()));
        assert_eq!(written(&table, &format, EnclosementPolicy::IfNeeded), b"\"a|b\",c");
    }

    #[test]
    fn test_policies() {
        let table = table(&[&["a", ""]]);
        let csv = FormatDefinition::csv();
        assert_eq!(written(&table, &csv, EnclosementPolicy::Always), b"\"a\",\"\"");
        assert_eq!(written(&table, &csv, EnclosementPolicy::Never), b"a,");
    }

    #[test]
    fn test_sparse_rows_and_eol_type() {
        let mut table = TableSz::new();
        table.add_string("r0", 0, 0);
        table.add_string("r5", 5, 1);
        let format = FormatDefinition::semicolon().with_eol_type(EndOfLineType::RN);
        let out = written(&table, &format, EnclosementPolicy::IfNeeded);
        assert_eq!(out, b"r0;\r\n;r5");
    }

    #[test]
    fn test_bom_and_encoding() {
        let table = table(&[&["é"]]);
        let format = FormatDefinition::csv()
            .with_encoding(TextEncoding::Utf16Le)
            .with_bom_writing(true);
        let out = written(&table, &format, EnclosementPolicy::IfNeeded);
        assert_eq!(out, vec![0xFF, 0xFE, 0xE9, 0x00]);

        let format = FormatDefinition::csv().with_bom_writing(true);
        let out = written(&table, &format, EnclosementPolicy::IfNeeded);
        assert_eq!(out, vec![0xEF, 0xBB, 0xBF, 0xC3, 0xA9]);

        let format = FormatDefinition::csv()
            .with_encoding(TextEncoding::Latin1)
            .with_bom_writing(true);
        let out = written(&table, &format, EnclosementPolicy::IfNeeded);
        assert_eq!(out, vec![0xE9]);
    }

    #[test]
    fn test_auto_separator_rejected() {
        let table = table(&[&["a"]]);
        let format = FormatDefinition::csv().with_separator(crate::delimited::format::FormatChar::Auto);
        let mut out = Vec::new();
        assert!(write_table(&table, &mut out, &format, EnclosementPolicy::IfNeeded).is_err());
    }
}
