//! Table storage, row identity, and observer tests

use std::sync::{Arc, Mutex};

use tabula::{CellValue, Column, Row, RowObject, Table, TableEvent, TableEventKind};

fn object(pairs: &[(&str, CellValue)]) -> Row {
    let row: RowObject = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    Row::Object(row)
}

#[test]
fn test_rows_as_objects_create_columns() {
    let mut table = Table::new();
    table.set_rows(
        vec![
            object(&[("name", "ann".into()), ("age", CellValue::from(31))]),
            object(&[("name", "bob".into())]),
        ],
        None,
        false,
    );

    assert_eq!(table.get_row_count(), 2);
    assert!(table.has_column("age"));
    assert_eq!(table.get_cell("age", 1), Some(CellValue::Undefined));

    let row = table.get_row_object(0).unwrap();
    assert_eq!(row.get("name"), Some(&CellValue::from("ann")));
    assert_eq!(table.get_cell("name", 2), None);
}

#[test]
fn test_insert_rows_shifts_following_rows() {
    let mut table = Table::with_id("t").with_columns([(
        "n",
        Column::cells(vec![CellValue::from(1), CellValue::from(2), CellValue::from(3)]),
    )]);
    table.set_row(Row::Values(vec![CellValue::from(9)]), Some(1), true);

    assert_eq!(
        table.get_column("n").unwrap().to_cells(),
        vec![CellValue::from(1), CellValue::from(9), CellValue::from(2), CellValue::from(3)]
    );

    let deleted = table.delete_rows(Some(0), 2);
    assert_eq!(deleted, vec![vec![CellValue::from(1)], vec![CellValue::from(9)]]);
    assert_eq!(table.get_row_count(), 2);
}

#[test]
fn test_every_mutation_changes_version() {
    let mut table = Table::new().with_columns([("a", Column::numbers(vec![1.0, 2.0]))]);
    let mut seen = vec![table.version_tag()];

    table.set_cell("a", 0, CellValue::from(5));
    seen.push(table.version_tag());
    table.set_column("b", Column::cells(vec!["x".into(), "y".into()]));
    seen.push(table.version_tag());
    table.delete_columns(&["b"]);
    seen.push(table.version_tag());
    table.delete_rows(Some(1), 1);
    seen.push(table.version_tag());

    for pair in seen.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
}

#[test]
fn test_clone_does_not_leak_writes() {
    let mut source = Table::new().with_columns([("a", Column::numbers(vec![1.0, 2.0, 3.0]))]);
    let copy = source.clone_table(false);
    source.set_cell("a", 0, CellValue::from(100));

    assert_eq!(copy.get_cell("a", 0), Some(CellValue::from(1)));
    assert_eq!(source.get_cell("a", 0), Some(CellValue::from(100)));

    let empty = source.clone_table(true);
    assert_eq!(empty.get_column_ids().count(), 0);
}

#[test]
fn test_row_identity_maps() {
    let mut table = Table::new().with_columns([("a", Column::numbers(vec![0.0; 3]))]);
    assert_eq!(table.get_original_row_index(2), Some(2));
    assert_eq!(table.get_local_row_index(1), Some(1));

    table.set_original_row_indexes(vec![7, 3, 5], false);
    assert_eq!(table.get_original_row_index(0), Some(7));
    assert_eq!(table.get_local_row_index(5), Some(2));
    assert_eq!(table.get_local_row_index(4), None);

    table.set_original_row_indexes(vec![7, 3, 5], true);
    assert_eq!(table.get_local_row_index(3), Some(1));
}

#[test]
fn test_event_pairs_wrap_mutations() {
    let mut table = Table::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let id = table.on(move |e: &TableEvent| sink.lock().unwrap().push(e.kind()));

    table.set_cell("a", 0, CellValue::from(1));
    table.delete_rows(None, 0);
    assert!(table.off(id));
    table.set_cell("a", 1, CellValue::from(2));

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            TableEventKind::SetCell,
            TableEventKind::AfterSetCell,
            TableEventKind::DeleteRows,
            TableEventKind::AfterDeleteRows,
        ]
    );
}

#[test]
fn test_lookup_by_value() {
    let table = Table::new().with_columns([(
        "s",
        Column::cells(vec!["a".into(), "b".into(), "a".into()]),
    )]);
    assert_eq!(table.get_row_index_by("s", &"a".into(), 0), Some(0));
    assert_eq!(table.get_row_index_by("s", &"a".into(), 1), Some(2));
    assert_eq!(table.get_row_index_by("s", &"z".into(), 0), None);
}
