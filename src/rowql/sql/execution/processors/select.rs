//! Projection stage: SELECT list evaluation, `*` expansion, DISTINCT
//! suppression, and PARTIALS recovery.

use crate::rowql::sql::ast::{SelectItem, SelectMode};
use crate::rowql::sql::error::SqlResult;
use crate::rowql::sql::execution::types::{OutputRow, Value};
use crate::rowql::sql::expr::{EvalContext, Evaluator, Scope};
use std::collections::HashSet;

/// Evaluates the SELECT list against one row or group context, producing at
/// most one [`OutputRow`]. Holds the DISTINCT seen-set across the run, so
/// one projector instance serves a whole pipeline.
pub struct Projector<'a> {
    items: &'a [SelectItem],
    mode: SelectMode,
    evaluator: &'a dyn Evaluator,
    /// Value tuples already emitted, in DISTINCT mode only
    seen: HashSet<String>,
}

impl<'a> Projector<'a> {
    pub fn new(items: &'a [SelectItem], mode: SelectMode, evaluator: &'a dyn Evaluator) -> Self {
        Projector {
            items,
            mode,
            evaluator,
            seen: HashSet::new(),
        }
    }

    /// Projects one context. Returns `None` when DISTINCT suppresses the
    /// row. Select-term failures are fatal unless the mode is PARTIALS, in
    /// which case the failing column becomes NULL and the row survives.
    pub fn project(&mut self, ctx: &EvalContext) -> SqlResult<Option<OutputRow>> {
        let mut columns: Vec<(String, Value)> = Vec::new();
        for item in self.items {
            match item {
                SelectItem::Star => {
                    for (name, value) in Self::star_columns(ctx) {
                        columns.push((name, value));
                    }
                }
                SelectItem::Term(term) => {
                    let value = match self.evaluator.evaluate(&term.expr, ctx) {
                        Ok(value) => value,
                        Err(_) if self.mode == SelectMode::Partials => Value::Null,
                        Err(e) => return Err(e),
                    };
                    let name = term
                        .alias
                        .clone()
                        .unwrap_or_else(|| format!("col{}", columns.len() + 1));
                    columns.push((name, value));
                }
            }
        }
        let row = OutputRow::new(columns);

        if self.mode == SelectMode::Distinct && !self.seen.insert(row.value_key()) {
            return Ok(None);
        }
        Ok(Some(row))
    }

    /// `*` expands to the context row's columns in their existing order. In
    /// group scope the group's first member stands in for the row; a
    /// non-mapping row contributes a single `col1` column.
    fn star_columns(ctx: &EvalContext) -> Vec<(String, Value)> {
        let row = match ctx.scope {
            Scope::Row(row) => row,
            Scope::Group(members) => match members.first() {
                Some(first) => first,
                None => return Vec::new(),
            },
        };
        match row {
            Value::Map(fields) => fields.clone(),
            other => vec![("col1".to_string(), other.clone())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rowql::sql::ast::SelectTerm;
    use crate::rowql::sql::expr::ExpressionEvaluator;
    use crate::rowql::sql::imports::ImportBindings;

    fn row(pairs: &[(&str, Value)]) -> Value {
        Value::Map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn term(evaluator: &ExpressionEvaluator, text: &str, alias: Option<&str>) -> SelectItem {
        SelectItem::Term(SelectTerm {
            expr: crate::rowql::sql::expr::Evaluator::compile(evaluator, text).unwrap(),
            alias: alias.map(|a| a.to_string()),
        })
    }

    #[test]
    fn projects_aliases_and_positional_names() {
        let evaluator = ExpressionEvaluator::new();
        let items = vec![
            term(&evaluator, "x * 10", Some("y")),
            term(&evaluator, "x + 1", None),
        ];
        let mut projector = Projector::new(&items, SelectMode::All, &evaluator);
        let imports = ImportBindings::empty();
        let r = row(&[("x", Value::Int(2))]);
        let out = projector
            .project(&EvalContext::row(&r, &imports))
            .unwrap()
            .unwrap();
        assert_eq!(
            out.columns,
            vec![
                ("y".to_string(), Value::Int(20)),
                ("col2".to_string(), Value::Int(3)),
            ]
        );
    }

    #[test]
    fn star_expands_in_row_order() {
        let evaluator = ExpressionEvaluator::new();
        let items = vec![SelectItem::Star, term(&evaluator, "1", Some("one"))];
        let mut projector = Projector::new(&items, SelectMode::All, &evaluator);
        let imports = ImportBindings::empty();
        let r = row(&[("b", Value::Int(2)), ("a", Value::Int(1))]);
        let out = projector
            .project(&EvalContext::row(&r, &imports))
            .unwrap()
            .unwrap();
        assert_eq!(out.names(), vec!["b", "a", "one"]);
    }

    #[test]
    fn distinct_suppresses_repeats_in_first_seen_order() {
        let evaluator = ExpressionEvaluator::new();
        let items = vec![term(&evaluator, "x", None)];
        let mut projector = Projector::new(&items, SelectMode::Distinct, &evaluator);
        let imports = ImportBindings::empty();

        let mut emitted = Vec::new();
        for v in [1, 2, 1, 3, 2] {
            let r = row(&[("x", Value::Int(v))]);
            if let Some(out) = projector.project(&EvalContext::row(&r, &imports)).unwrap() {
                emitted.push(out.columns[0].1.clone());
            }
        }
        assert_eq!(
            emitted,
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn partials_recovers_failing_term_to_null() {
        let evaluator = ExpressionEvaluator::new();
        // division by zero fails for non-null operands
        let items = vec![
            term(&evaluator, "x", Some("a")),
            term(&evaluator, "1 / 0", Some("broken")),
            term(&evaluator, "x + 1", Some("b")),
        ];
        let imports = ImportBindings::empty();
        let r = row(&[("x", Value::Int(5))]);

        let mut partials = Projector::new(&items, SelectMode::Partials, &evaluator);
        let out = partials
            .project(&EvalContext::row(&r, &imports))
            .unwrap()
            .unwrap();
        assert_eq!(
            out.columns,
            vec![
                ("a".to_string(), Value::Int(5)),
                ("broken".to_string(), Value::Null),
                ("b".to_string(), Value::Int(6)),
            ]
        );

        let mut strict = Projector::new(&items, SelectMode::All, &evaluator);
        assert!(strict.project(&EvalContext::row(&r, &imports)).is_err());
    }

    #[test]
    fn non_map_row_under_star() {
        let evaluator = ExpressionEvaluator::new();
        let items = vec![SelectItem::Star];
        let mut projector = Projector::new(&items, SelectMode::All, &evaluator);
        let imports = ImportBindings::empty();
        let r = Value::Str("plain line".to_string());
        let out = projector
            .project(&EvalContext::row(&r, &imports))
            .unwrap()
            .unwrap();
        assert_eq!(out.names(), vec!["col1"]);
    }
}
