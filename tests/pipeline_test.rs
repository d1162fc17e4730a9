//! End-to-end pipeline tests: full queries run through the public entry
//! point against in-process bindings.

use rowql::rowql::{run_query, Value};
use std::collections::HashMap;

/// Helper to build a row map from (name, value) pairs
fn row(columns: Vec<(&str, Value)>) -> Value {
    Value::Map(
        columns
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}

fn bind(name: &str, rows: Vec<Value>) -> HashMap<String, Value> {
    HashMap::from([(name.to_string(), Value::List(rows))])
}

fn result_rows(value: Value) -> Vec<Value> {
    match value {
        Value::List(rows) => rows,
        other => panic!("expected list result, got {:?}", other),
    }
}

fn numbers(values: &[i64]) -> Vec<Value> {
    values
        .iter()
        .map(|v| row(vec![("x", Value::Int(*v))]))
        .collect()
}

#[test]
fn where_preserves_input_order() {
    let out = run_query(
        "SELECT x FROM data WHERE x % 2 == 0",
        bind("data", numbers(&[5, 2, 9, 4, 6, 1])),
    )
    .unwrap();
    assert_eq!(
        result_rows(out),
        vec![
            row(vec![("x", Value::Int(2))]),
            row(vec![("x", Value::Int(4))]),
            row(vec![("x", Value::Int(6))]),
        ]
    );
}

#[test]
fn null_predicate_drops_rows_without_error() {
    // Comparing NULL is falsy, never an error, so rows with a missing
    // member are silently filtered out.
    let rows = vec![
        row(vec![("x", Value::Int(10))]),
        row(vec![("y", Value::Int(99))]),
        row(vec![("x", Value::Int(3))]),
    ];
    let out = run_query("SELECT x FROM data WHERE x > 5", bind("data", rows)).unwrap();
    assert_eq!(result_rows(out), vec![row(vec![("x", Value::Int(10))])]);
}

#[test]
fn distinct_suppresses_repeats_keeping_first_seen_order() {
    let out = run_query(
        "SELECT DISTINCT x FROM data",
        bind("data", numbers(&[3, 1, 3, 2, 1, 3])),
    )
    .unwrap();
    assert_eq!(
        result_rows(out),
        vec![
            row(vec![("x", Value::Int(3))]),
            row(vec![("x", Value::Int(1))]),
            row(vec![("x", Value::Int(2))]),
        ]
    );
}

#[test]
fn distinct_keeps_rows_whose_strings_contain_separators() {
    // Key encoding must not let a string payload forge a tuple boundary.
    let rows = vec![
        row(vec![
            ("a", Value::Str("a".to_string())),
            ("b", Value::Str("b\u{1f}s:c".to_string())),
        ]),
        row(vec![
            ("a", Value::Str("a\u{1f}s:b".to_string())),
            ("b", Value::Str("c".to_string())),
        ]),
    ];
    let out = run_query("SELECT DISTINCT a, b FROM data", bind("data", rows)).unwrap();
    assert_eq!(result_rows(out).len(), 2);
}

#[test]
fn partials_recovers_failing_columns_to_null() {
    let rows = vec![
        row(vec![("x", Value::Int(4))]),
        row(vec![("x", Value::Str("oops".to_string()))]),
    ];
    let out = run_query(
        "SELECT PARTIALS x + 1 AS bumped, x AS raw FROM data",
        bind("data", rows),
    )
    .unwrap();
    assert_eq!(
        result_rows(out),
        vec![
            row(vec![("bumped", Value::Int(5)), ("raw", Value::Int(4))]),
            row(vec![
                ("bumped", Value::Null),
                ("raw", Value::Str("oops".to_string())),
            ]),
        ]
    );
}

#[test]
fn without_partials_a_failing_column_aborts() {
    let rows = vec![row(vec![("x", Value::Str("oops".to_string()))])];
    let err = run_query("SELECT x + 1 AS bumped FROM data", bind("data", rows)).unwrap_err();
    assert!(err.to_string().contains("row 0"));
}

#[test]
fn group_by_with_aggregates_over_members() {
    let rows = vec![
        row(vec![("k", Value::Str("a".to_string())), ("v", Value::Int(1))]),
        row(vec![("k", Value::Str("b".to_string())), ("v", Value::Int(10))]),
        row(vec![("k", Value::Str("a".to_string())), ("v", Value::Int(2))]),
        row(vec![("k", Value::Str("b".to_string())), ("v", Value::Null)]),
    ];
    let out = run_query(
        "SELECT k, count(v) AS n, sum(v) AS total FROM data GROUP BY 1",
        bind("data", rows),
    )
    .unwrap();
    // Groups appear in first-seen order; count and sum skip NULLs.
    assert_eq!(
        result_rows(out),
        vec![
            row(vec![
                ("k", Value::Str("a".to_string())),
                ("n", Value::Int(2)),
                ("total", Value::Int(3)),
            ]),
            row(vec![
                ("k", Value::Str("b".to_string())),
                ("n", Value::Int(1)),
                ("total", Value::Int(10)),
            ]),
        ]
    );
}

#[test]
fn order_by_desc_places_nulls_last_when_asked() {
    let rows = vec![
        row(vec![("x", Value::Int(5))]),
        row(vec![("x", Value::Null)]),
        row(vec![("x", Value::Int(1))]),
        row(vec![("x", Value::Null)]),
        row(vec![("x", Value::Int(3))]),
    ];
    let out = run_query(
        "SELECT x FROM data ORDER BY 1 DESC NULLS LAST",
        bind("data", rows),
    )
    .unwrap();
    let values: Vec<Value> = result_rows(out)
        .into_iter()
        .map(|r| r.get_member("x"))
        .collect();
    assert_eq!(
        values,
        vec![
            Value::Int(5),
            Value::Int(3),
            Value::Int(1),
            Value::Null,
            Value::Null,
        ]
    );
}

#[test]
fn order_by_default_treats_nulls_as_largest() {
    let rows = vec![
        row(vec![("x", Value::Null)]),
        row(vec![("x", Value::Int(2))]),
        row(vec![("x", Value::Int(1))]),
    ];
    let asc = run_query("SELECT x FROM data ORDER BY 1", bind("data", rows.clone())).unwrap();
    let asc_values: Vec<Value> = result_rows(asc)
        .into_iter()
        .map(|r| r.get_member("x"))
        .collect();
    assert_eq!(asc_values, vec![Value::Int(1), Value::Int(2), Value::Null]);

    let desc = run_query("SELECT x FROM data ORDER BY 1 DESC", bind("data", rows)).unwrap();
    let desc_values: Vec<Value> = result_rows(desc)
        .into_iter()
        .map(|r| r.get_member("x"))
        .collect();
    assert_eq!(desc_values, vec![Value::Null, Value::Int(2), Value::Int(1)]);
}

#[test]
fn offset_and_limit_window_the_result() {
    let out = run_query(
        "SELECT x FROM data LIMIT 3 OFFSET 2",
        bind("data", numbers(&[0, 1, 2, 3, 4, 5])),
    )
    .unwrap();
    let values: Vec<Value> = result_rows(out)
        .into_iter()
        .map(|r| r.get_member("x"))
        .collect();
    assert_eq!(values, vec![Value::Int(2), Value::Int(3), Value::Int(4)]);
}

#[test]
fn limit_zero_yields_nothing() {
    let out = run_query(
        "SELECT x FROM data LIMIT 0",
        bind("data", numbers(&[1, 2, 3])),
    )
    .unwrap();
    assert!(result_rows(out).is_empty());
}

#[test]
fn star_expands_row_columns_in_order() {
    let rows = vec![row(vec![
        ("b", Value::Int(1)),
        ("a", Value::Int(2)),
    ])];
    let out = run_query("SELECT *, a + b AS s FROM data", bind("data", rows)).unwrap();
    assert_eq!(
        result_rows(out),
        vec![row(vec![
            ("b", Value::Int(1)),
            ("a", Value::Int(2)),
            ("s", Value::Int(3)),
        ])]
    );
}

#[test]
fn explode_fans_out_nested_lists() {
    let rows = vec![
        row(vec![
            ("id", Value::Int(1)),
            (
                "tags",
                Value::List(vec![
                    Value::Str("x".to_string()),
                    Value::Str("y".to_string()),
                ]),
            ),
        ]),
        row(vec![("id", Value::Int(2)), ("tags", Value::List(Vec::new()))]),
    ];
    let out = run_query(
        "SELECT id, tags FROM data EXPLODE tags",
        bind("data", rows),
    )
    .unwrap();
    assert_eq!(
        result_rows(out),
        vec![
            row(vec![("id", Value::Int(1)), ("tags", Value::Str("x".to_string()))]),
            row(vec![("id", Value::Int(1)), ("tags", Value::Str("y".to_string()))]),
        ]
    );
}

#[test]
fn member_access_and_imported_functions() {
    let rows = vec![row(vec![(
        "payload",
        row(vec![("value", Value::Int(16))]),
    )])];
    let out = run_query(
        "IMPORT math SELECT math.sqrt(payload->value) AS root FROM data",
        bind("data", rows),
    )
    .unwrap();
    assert_eq!(
        result_rows(out),
        vec![row(vec![("root", Value::Float(4.0))])]
    );
}

#[test]
fn unknown_import_is_reported_before_any_row() {
    let err = run_query("IMPORT nosuch SELECT 1", HashMap::new()).unwrap_err();
    assert!(err.to_string().contains("nosuch"));
}

#[test]
fn null_arithmetic_flows_to_output_instead_of_failing() {
    let rows = vec![
        row(vec![("x", Value::Int(7))]),
        row(vec![("x", Value::Null)]),
    ];
    let out = run_query("SELECT x + 1 AS y FROM data", bind("data", rows)).unwrap();
    assert_eq!(
        result_rows(out),
        vec![
            row(vec![("y", Value::Int(8))]),
            row(vec![("y", Value::Null)]),
        ]
    );
}
