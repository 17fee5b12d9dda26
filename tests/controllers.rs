//! Query controller tests: option changes, persisted state, recompute policy

use std::sync::Arc;

use tabula::{
    CellValue, Column, Comparator, Condition, GridConfig, Operator, QueryState, QueryingController,
    SortDirection, Table,
};

fn products() -> Table {
    Table::with_id("products").with_columns([
        (
            "name",
            Column::cells(
                ["pear", "Apple", "fig", "banana", "Avocado", "kiwi", "apricot"]
                    .into_iter()
                    .map(CellValue::from)
                    .collect(),
            ),
        ),
        (
            "price",
            Column::numbers(vec![3.0, 1.5, 8.0, 0.5, 2.5, 4.0, 6.0]),
        ),
    ])
}

fn visible_names(q: &QueryingController) -> Vec<String> {
    let p = q.presentation().unwrap();
    p.rows()
        .map(|r| r.get("name").to_display_string())
        .collect()
}

#[test]
fn test_query_from_yaml() {
    let yaml = r#"
sorting:
  - columnId: price
    order: desc
filtering:
  - columnId: name
    operator: beginsWith
    value: a
pagination:
  enabled: true
  pageSize: 2
"#;
    let state = QueryState::from_yaml(yaml).unwrap();
    let mut q = QueryingController::default();
    assert_eq!(q.load_state(&state), 0);

    let table = products();
    q.proceed(&table, false).unwrap();
    assert_eq!(visible_names(&q), vec!["apricot", "Avocado"]);
    assert_eq!(q.pagination().total_pages(), 2);

    q.pagination_mut().next_page();
    q.proceed(&table, false).unwrap();
    assert_eq!(visible_names(&q), vec!["Apple"]);
}

#[test]
fn test_clearing_options_restores_source_order() {
    let table = products();
    let mut q = QueryingController::default();
    q.sorting_mut().set_sorting(Some(SortDirection::Asc), "price");
    q.filtering_mut().add_column_filter("price", "<", 5);
    q.proceed(&table, false).unwrap();
    assert_eq!(
        visible_names(&q),
        vec!["banana", "Apple", "Avocado", "pear", "kiwi"]
    );

    q.sorting_mut().clear();
    q.filtering_mut().clear();
    assert!(q.should_be_updated());
    q.proceed(&table, false).unwrap();
    assert_eq!(visible_names(&q).len(), 7);
    let originals: Vec<Option<usize>> = q
        .presentation()
        .unwrap()
        .rows()
        .map(|r| r.original_index())
        .collect();
    assert_eq!(originals, (0..7).map(Some).collect::<Vec<_>>());
}

#[test]
fn test_case_sensitive_config() {
    let config = GridConfig {
        case_sensitive_filters: true,
        ..GridConfig::default()
    };
    let table = products();
    let mut q = QueryingController::new(&config);
    q.filtering_mut().add_column_filter("name", "startsWith", "A");
    q.proceed(&table, false).unwrap();
    assert_eq!(visible_names(&q), vec!["Apple", "Avocado"]);
}

#[test]
fn test_condition_tree_per_column() {
    let table = products();
    let mut q = QueryingController::default();
    q.filtering_mut().add_column_filter_condition(
        "price",
        Condition::or(vec![
            Condition::leaf("price", Operator::Lt, 1),
            Condition::leaf("price", Operator::Gt, 7),
        ]),
    );
    q.proceed(&table, false).unwrap();
    assert_eq!(visible_names(&q), vec!["fig", "banana"]);
}

#[test]
fn test_custom_comparator_from_controller() {
    let table = products();
    let mut q = QueryingController::default();
    let by_lowercase: Comparator = Arc::new(|a: &CellValue, b: &CellValue| {
        Ok(a.to_display_string()
            .to_lowercase()
            .cmp(&b.to_display_string().to_lowercase()))
    });
    q.sorting_mut().set_compare("name", by_lowercase);
    q.sorting_mut().set_sorting(Some(SortDirection::Asc), "name");
    q.proceed(&table, false).unwrap();
    assert_eq!(
        visible_names(&q),
        vec!["Apple", "apricot", "Avocado", "banana", "fig", "kiwi", "pear"]
    );
}

#[test]
fn test_page_clamps_after_filter_narrows() {
    let table = products();
    let mut q = QueryingController::default();
    q.pagination_mut().set_enabled(true);
    q.pagination_mut().set_page_size(2);
    q.proceed(&table, false).unwrap();
    q.pagination_mut().last_page();
    assert_eq!(q.pagination().current_page(), 4);

    q.filtering_mut().add_column_filter("price", ">", 3);
    q.proceed(&table, false).unwrap();
    assert_eq!(q.pagination().current_page(), 2);
    assert_eq!(visible_names(&q), vec!["apricot"]);
}

#[test]
fn test_unknown_operator_in_state_is_dropped() {
    let json = r#"{
        "filtering": [
            { "columnId": "price", "operator": "between", "value": 2 },
            { "columnId": "name", "operator": "doesNotContain", "value": "a" }
        ]
    }"#;
    let state = QueryState::from_json(json).unwrap();
    assert_eq!(state.invalid_filters().len(), 1);

    let table = products();
    let mut q = QueryingController::default();
    assert_eq!(q.load_state(&state), 1);
    q.proceed(&table, false).unwrap();
    assert_eq!(visible_names(&q), vec!["fig", "kiwi"]);
}
