//! ORDER BY stage: stable sort over precomputed sort-key tuples.
//!
//! Sort keys are evaluated while each result row's context is still alive
//! (at projection time); this processor only compares. A NULL key never
//! goes through the absorbing comparator: its position is decided solely by
//! the term's declared NULLS FIRST/LAST policy.

use crate::rowql::sql::ast::{NullOrdering, OrderByTerm, OrderDirection};
use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::types::{OutputRow, Value};
use std::cmp::Ordering;

/// Sorts projected rows by their key tuples. Stable: rows with fully equal
/// keys keep their pre-sort relative order. Key type mismatches surface as
/// an error after the sort pass rather than being swallowed.
pub fn sort_rows(
    mut rows: Vec<(OutputRow, Vec<Value>)>,
    terms: &[OrderByTerm],
) -> SqlResult<Vec<OutputRow>> {
    let mut first_error: Option<SqlError> = None;
    rows.sort_by(|(_, a), (_, b)| match compare_key_tuples(a, b, terms) {
        Ok(ordering) => ordering,
        Err(e) => {
            if first_error.is_none() {
                first_error = Some(e);
            }
            Ordering::Equal
        }
    });
    if let Some(e) = first_error {
        return Err(e);
    }
    Ok(rows.into_iter().map(|(row, _)| row).collect())
}

fn compare_key_tuples(
    a: &[Value],
    b: &[Value],
    terms: &[OrderByTerm],
) -> SqlResult<Ordering> {
    for (i, term) in terms.iter().enumerate() {
        let left = a.get(i).unwrap_or(&Value::Null);
        let right = b.get(i).unwrap_or(&Value::Null);

        let ordering = match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            // NULL placement ignores ASC/DESC: FIRST means first in the
            // final output order.
            (true, false) => match term.nulls {
                NullOrdering::First => return Ok(Ordering::Less),
                NullOrdering::Last => return Ok(Ordering::Greater),
            },
            (false, true) => match term.nulls {
                NullOrdering::First => return Ok(Ordering::Greater),
                NullOrdering::Last => return Ok(Ordering::Less),
            },
            (false, false) => {
                let natural = left.cmp_values(right)?;
                match term.direction {
                    OrderDirection::Asc => natural,
                    OrderDirection::Desc => natural.reverse(),
                }
            }
        };
        if ordering != Ordering::Equal {
            return Ok(ordering);
        }
    }
    Ok(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rowql::sql::ast::OrderKey;
    use crate::rowql::sql::expr::{Evaluator, ExpressionEvaluator};

    fn keyed(values: Vec<Value>) -> Vec<(OutputRow, Vec<Value>)> {
        values
            .into_iter()
            .map(|v| {
                (
                    OutputRow::new(vec![("v".to_string(), v.clone())]),
                    vec![v],
                )
            })
            .collect()
    }

    fn term(direction: OrderDirection, nulls: NullOrdering) -> OrderByTerm {
        let evaluator = ExpressionEvaluator::new();
        OrderByTerm {
            key: OrderKey::Expr(evaluator.compile("v").unwrap()),
            direction,
            nulls,
        }
    }

    fn column_values(rows: &[OutputRow]) -> Vec<Value> {
        rows.iter().map(|r| r.columns[0].1.clone()).collect()
    }

    #[test]
    fn desc_nulls_last() {
        let rows = keyed(vec![
            Value::Int(5),
            Value::Null,
            Value::Int(1),
            Value::Null,
            Value::Int(3),
        ]);
        let sorted =
            sort_rows(rows, &[term(OrderDirection::Desc, NullOrdering::Last)]).unwrap();
        assert_eq!(
            column_values(&sorted),
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
    fn asc_nulls_first() {
        let rows = keyed(vec![Value::Int(2), Value::Null, Value::Int(1)]);
        let sorted =
            sort_rows(rows, &[term(OrderDirection::Asc, NullOrdering::First)]).unwrap();
        assert_eq!(
            column_values(&sorted),
            vec![Value::Null, Value::Int(1), Value::Int(2)]
        );
    }

    #[test]
    fn stable_on_equal_keys() {
        let rows: Vec<(OutputRow, Vec<Value>)> = vec![
            (
                OutputRow::new(vec![
                    ("v".to_string(), Value::Int(1)),
                    ("tag".to_string(), Value::Str("first".into())),
                ]),
                vec![Value::Int(1)],
            ),
            (
                OutputRow::new(vec![
                    ("v".to_string(), Value::Int(1)),
                    ("tag".to_string(), Value::Str("second".into())),
                ]),
                vec![Value::Int(1)],
            ),
        ];
        let sorted =
            sort_rows(rows, &[term(OrderDirection::Asc, NullOrdering::Last)]).unwrap();
        assert_eq!(sorted[0].columns[1].1, Value::Str("first".into()));
        assert_eq!(sorted[1].columns[1].1, Value::Str("second".into()));
    }

    #[test]
    fn incomparable_keys_error() {
        let rows = keyed(vec![Value::Int(1), Value::Str("x".into())]);
        assert!(sort_rows(rows, &[term(OrderDirection::Asc, NullOrdering::Last)]).is_err());
    }
}
