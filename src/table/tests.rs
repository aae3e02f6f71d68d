use super::*;
use crate::delimited::format::FormatDefinition;
use crate::delimited::reader::ReadOptions;
use proptest::prelude::*;

fn filled(cells: &[(usize, usize, &str)]) -> TableSz {
    let mut table = TableSz::new();
    for &(row, col, value) in cells {
        assert!(table.add_string(value, row, col));
    }
    table
}

fn column_values(table: &TableSz, col: usize) -> Vec<(usize, String)> {
    let mut values = Vec::new();
    table.for_each_row_in_column(col, |row, value| values.push((row, value.to_string())));
    values
}

#[test]
fn test_add_and_get() {
    let table = filled(&[(0, 0, "a"), (0, 2, "c"), (4, 1, "")]);
    assert_eq!(table.get(0, 0), Some("a"));
    assert_eq!(table.get(4, 1), Some(""));
    assert_eq!(table.get(1, 0), None);
    assert_eq!(table.get(0, 9), None);
    assert_eq!(table.col_count(), 3);
    assert_eq!(table.row_count_by_max_row_index(), 5);
    assert_eq!(table.cell_count_non_empty(), 2);
    assert_eq!(table.content_storage_size(), 4);
    assert_eq!(table.handle(4, 1), Some(StrHandle::EMPTY));
}

#[test]
fn test_oversized_rejected_without_change() {
    let config = TableConfig::new().with_block_size(4).with_allow_oversized_strings(false);
    let mut table = TableSz::with_config(config);
    assert!(table.add_string("ok", 0, 0));
    assert!(!table.add_string("toolong", 0, 0));
    assert!(!table.add_string("four", 1, 3));
    assert_eq!(table.get(0, 0), Some("ok"));
    assert_eq!(table.get(1, 3), None);
    assert_eq!(table.col_count(), 1);
}

#[test]
fn test_oversized_allowed() {
    let mut table = TableSz::with_config(TableConfig::new().with_block_size(4));
    let long = "x".repeat(100);
    assert!(table.add_string(&long, 0, 0));
    assert_eq!(table.get(0, 0), Some(long.as_str()));
}

#[test]
fn test_remove_rows_shifts() {
    let mut table = filled(&[(0, 0, "r0"), (1, 0, "r1"), (2, 0, "r2"), (3, 1, "r3"), (5, 0, "r5")]);
    table.remove_rows(1, 2);
    assert_eq!(table.get(0, 0), Some("r0"));
    assert_eq!(table.get(1, 1), Some("r3"));
    assert_eq!(table.get(3, 0), Some("r5"));
    assert_eq!(table.row_count_by_max_row_index(), 4);
    assert_eq!(table.row_indices(), vec![0, 1, 3]);
}

#[test]
fn test_insert_rows_at() {
    let mut table = filled(&[(0, 0, "a"), (1, 0, "b"), (1, 1, "B")]);
    table.insert_rows_at(1, 2);
    assert_eq!(table.get(0, 0), Some("a"));
    assert_eq!(table.get(1, 0), None);
    assert_eq!(table.get(3, 0), Some("b"));
    assert_eq!(table.get(3, 1), Some("B"));
}

#[test]
fn test_column_insert_and_erase() {
    let mut table = filled(&[(0, 0, "a"), (0, 1, "b"), (0, 2, "c")]);
    table.insert_columns_at(1, 2);
    assert_eq!(table.col_count(), 5);
    assert_eq!(table.get(0, 3), Some("b"));
    assert_eq!(table.get(0, 1), None);

    table.erase_columns_by_pos_and_count(0, 2);
    assert_eq!(table.col_count(), 3);
    assert_eq!(table.get(0, 0), None);
    assert_eq!(table.get(0, 1), Some("b"));
    assert_eq!(table.get(0, 2), Some("c"));

    table.erase_columns_by_pos_and_count(2, 10);
    assert_eq!(table.col_count(), 2);
}

#[test]
fn test_sort_by_column_moves_whole_rows() {
    let mut table = filled(&[
        (0, 0, "b"),
        (0, 1, "B"),
        (1, 0, "a"),
        (1, 1, "A"),
        (2, 1, "-"),
        (3, 0, "c"),
        (3, 1, "C"),
    ]);
    table.sort_by_column_default(0);
    assert_eq!(
        column_values(&table, 0),
        vec![(1, "a".to_string()), (2, "b".to_string()), (3, "c".to_string())]
    );
    assert_eq!(table.get(0, 1), Some("-"));
    assert_eq!(table.get(1, 1), Some("A"));
    assert_eq!(table.get(2, 1), Some("B"));
    assert_eq!(table.get(3, 1), Some("C"));

    table.sort_by_column(0, |a, b| b.cmp(&a));
    assert_eq!(table.get(0, 0), Some("c"));
    assert_eq!(table.get(3, 0), None);
    assert_eq!(table.get(3, 1), Some("-"));
}

#[test]
fn test_append_rows_from() {
    let mut first = filled(&[(0, 0, "a"), (1, 1, "b")]);
    let second = filled(&[(0, 0, "c"), (0, 2, "d")]);
    assert_eq!(first.append_rows_from(&second, 2), 0);
    assert_eq!(first.get(2, 0), Some("c"));
    assert_eq!(first.get(2, 2), Some("d"));
    assert_eq!(first.row_indices(), vec![0, 1, 2]);
}

#[test]
fn test_clear_and_shrink() {
    let mut table = filled(&[(0, 0, "a"), (0, 3, "b")]);
    table.clear();
    assert_eq!(table.col_count(), 0);
    assert_eq!(table.content_storage_size(), 0);
    assert_eq!(table.get(0, 0), None);
    table.shrink_to_fit();
    assert!(table.add_string("again", 0, 0));
    assert_eq!(table.get(0, 0), Some("again"));
}

#[test]
fn test_read_slice_into_table() {
    let mut table = TableSz::new();
    let (summary, failed) = read_slice_into_table(
        b"name,qty\n\"bolt, m4\",10\n",
        &FormatDefinition::csv(),
        &ReadOptions::default(),
        &mut table,
    )
    .unwrap();
    assert_eq!(failed, 0);
    assert_eq!(summary.rows, 2);
    assert_eq!(table.get(1, 0), Some("bolt, m4"));
    assert_eq!(table.get(1, 1), Some("10"));
}

#[test]
fn test_handler_counts_rejected_cells() {
    let config = TableConfig::new().with_block_size(4).with_allow_oversized_strings(false);
    let mut table = TableSz::with_config(config);
    let (_, failed) = read_into_table(
        &b"ab,abcdef\nabcdefg,c"[..],
        &FormatDefinition::csv(),
        &ReadOptions::default(),
        &mut table,
    )
    .unwrap();
    assert_eq!(failed, 2);
    assert_eq!(table.get(0, 0), Some("ab"));
    assert_eq!(table.get(1, 1), Some("c"));
    assert_eq!(table.get(0, 1), None);
}

#[test]
fn test_handler_row_offset() {
    let mut table = TableSz::new();
    let mut handler = TableSzHandler::new(&mut table).with_row_offset(10);
    crate::delimited::reader::read_slice(b"x", &FormatDefinition::csv(), &ReadOptions::default(), &mut handler)
        .unwrap();
    assert_eq!(handler.failed(), 0);
    assert_eq!(table.get(10, 0), Some("x"));
}

#[test]
fn test_strings_do_not_move() {
    let mut table = TableSz::with_config(TableConfig::new().with_block_size(32));
    table.add_string("anchor", 0, 0);
    let before = table.get(0, 0).map(str::as_ptr);
    for row in 1..500 {
        table.add_string(&format!("value {row}"), row, 0);
    }
    assert_eq!(table.get(0, 0).map(str::as_ptr), before);
    assert_eq!(table.get(0, 0), Some("anchor"));
}

proptest! {
    #[test]
    fn prop_stored_values_survive_growth(
        cells in prop::collection::vec((0usize..50, 0usize..6, "[a-z]{0,40}"), 1..120),
        block_size in 1usize..64,
    ) {
        let mut table = TableSz::with_config(TableConfig::new().with_block_size(block_size));
        let mut expected = std::collections::BTreeMap::new();
        for (row, col, value) in &cells {
            prop_assert!(table.add_string(value, *row, *col));
            expected.insert((*row, *col), value.clone());
        }
        for ((row, col), value) in &expected {
            prop_assert_eq!(table.get(*row, *col), Some(value.as_str()));
        }
    }
}
