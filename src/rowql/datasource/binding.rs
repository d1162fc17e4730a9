//! In-process bindings: `FROM name` resolved against values supplied by
//! the embedding program rather than read from a file.
//!
//! A bound list fans out element by element; a bound scalar or map yields
//! a single row. Non-map rows are wrapped so column access stays uniform
//! across sources.

use crate::rowql::datasource::RowSource;
use crate::rowql::sql::error::SqlResult;
use crate::rowql::sql::execution::types::Value;
use std::collections::VecDeque;

pub struct BindingSource {
    rows: VecDeque<Value>,
}

impl BindingSource {
    pub fn new(value: Value) -> Self {
        let rows = match value {
            Value::List(items) => items.into_iter().map(wrap_row).collect(),
            other => VecDeque::from([wrap_row(other)]),
        };
        BindingSource { rows }
    }
}

fn wrap_row(value: Value) -> Value {
    match value {
        row @ Value::Map(_) => row,
        scalar => Value::Map(vec![("col1".to_string(), scalar)]),
    }
}

impl RowSource for BindingSource {
    fn next_row(&mut self) -> SqlResult<Option<Value>> {
        Ok(self.rows.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_fans_out_to_rows() {
        let mut src = BindingSource::new(Value::List(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(
            src.next_row().unwrap().unwrap(),
            Value::Map(vec![("col1".to_string(), Value::Int(1))])
        );
        assert_eq!(
            src.next_row().unwrap().unwrap().get_member("col1"),
            Value::Int(2)
        );
        assert!(src.next_row().unwrap().is_none());
    }

    #[test]
    fn scalar_yields_one_row() {
        let mut src = BindingSource::new(Value::Str("only".to_string()));
        assert_eq!(
            src.next_row().unwrap().unwrap().get_member("col1"),
            Value::Str("only".to_string())
        );
        assert!(src.next_row().unwrap().is_none());
    }

    #[test]
    fn map_rows_pass_through_unwrapped() {
        let row = Value::Map(vec![("a".to_string(), Value::Int(7))]);
        let mut src = BindingSource::new(Value::List(vec![row.clone()]));
        assert_eq!(src.next_row().unwrap().unwrap(), row);
    }
}
