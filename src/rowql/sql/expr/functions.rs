//! Builtin scalar and aggregate functions.
//!
//! Scalar builtins follow the null-safe convention: NULL arguments
//! short-circuit to NULL, and the conversion helpers additionally recover
//! conversion failures to NULL. Aggregates are evaluated once per finalized
//! group against the full member collection; they skip NULL inputs (except
//! `list`, which collects every value) and yield NULL over an empty input.

use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::types::Value;

/// Names that are aggregate functions when called without a module prefix.
pub const AGGREGATE_NAMES: &[&str] = &["count", "sum", "avg", "min", "max", "list"];

pub fn is_aggregate(name: &str) -> bool {
    AGGREGATE_NAMES.contains(&name)
}

/// Dispatches a scalar builtin by name.
pub fn call_scalar(name: &str, args: &[Value]) -> SqlResult<Value> {
    match (name, args) {
        // Conversions recover failures to NULL; no null guard needed, they
        // propagate NULL themselves.
        ("to_int", [v]) => Ok(v.to_int()),
        ("to_float", [v]) => Ok(v.to_float()),
        ("to_str", [v]) => Ok(v.to_str_value()),

        ("len", [v]) => Ok(Value::Int(v.len()?)),
        ("coalesce", args) if !args.is_empty() => Ok(args
            .iter()
            .find(|v| !v.is_null())
            .cloned()
            .unwrap_or(Value::Null)),
        ("ifnull", [v, fallback]) => Ok(if v.is_null() {
            fallback.clone()
        } else {
            v.clone()
        }),

        ("abs", [v]) => match v {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => Ok(Value::Int(i.wrapping_abs())),
            Value::Float(x) => Ok(Value::Float(x.abs())),
            other => Err(numeric_error(other)),
        },
        ("round", [v]) => round(v, 0),
        ("round", [v, Value::Int(digits)]) => round(v, *digits),
        ("round", [_, Value::Null]) => Ok(Value::Null),

        ("upper", [v]) => map_str(v, |s| s.to_uppercase()),
        ("lower", [v]) => map_str(v, |s| s.to_lowercase()),
        ("trim", [v]) => map_str(v, |s| s.trim().to_string()),

        (name, args) => Err(SqlError::execution_error(
            format!(
                "unknown function '{}' with {} argument(s)",
                name,
                args.len()
            ),
            None,
        )),
    }
}

fn round(v: &Value, digits: i64) -> SqlResult<Value> {
    match v {
        Value::Null => Ok(Value::Null),
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(x) => {
            let factor = 10f64.powi(digits as i32);
            let rounded = (x * factor).round() / factor;
            if digits <= 0 {
                Ok(Value::Int(rounded as i64))
            } else {
                Ok(Value::Float(rounded))
            }
        }
        other => Err(numeric_error(other)),
    }
}

fn map_str(v: &Value, f: impl Fn(&str) -> String) -> SqlResult<Value> {
    match v {
        Value::Null => Ok(Value::Null),
        Value::Str(s) => Ok(Value::Str(f(s))),
        other => Err(SqlError::type_error(
            "Str",
            other.type_name(),
            Some(other.to_string()),
        )),
    }
}

fn numeric_error(v: &Value) -> SqlError {
    SqlError::type_error("numeric", v.type_name(), Some(v.to_string()))
}

/// Folds per-member values into one aggregate result.
pub fn aggregate(name: &str, values: &[Value]) -> SqlResult<Value> {
    match name {
        "count" => Ok(Value::Int(
            values.iter().filter(|v| !v.is_null()).count() as i64
        )),
        "list" => Ok(Value::List(values.to_vec())),
        "sum" => fold_numeric(values, |acc, v| acc.add(v)),
        "min" => fold_compare(values, std::cmp::Ordering::Less),
        "max" => fold_compare(values, std::cmp::Ordering::Greater),
        "avg" => {
            let non_null: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
            if non_null.is_empty() {
                return Ok(Value::Null);
            }
            let mut sum = Value::Int(0);
            for v in &non_null {
                sum = sum.add(v)?;
            }
            sum.divide(&Value::Int(non_null.len() as i64))
        }
        other => Err(SqlError::execution_error(
            format!("unknown aggregate '{}'", other),
            None,
        )),
    }
}

fn fold_numeric(
    values: &[Value],
    op: impl Fn(&Value, &Value) -> SqlResult<Value>,
) -> SqlResult<Value> {
    let mut acc: Option<Value> = None;
    for v in values {
        if v.is_null() {
            continue;
        }
        acc = Some(match acc {
            None => v.clone(),
            Some(current) => op(&current, v)?,
        });
    }
    Ok(acc.unwrap_or(Value::Null))
}

fn fold_compare(values: &[Value], keep: std::cmp::Ordering) -> SqlResult<Value> {
    let mut acc: Option<Value> = None;
    for v in values {
        if v.is_null() {
            continue;
        }
        acc = Some(match acc {
            None => v.clone(),
            Some(current) => {
                if v.cmp_values(&current)? == keep {
                    v.clone()
                } else {
                    current
                }
            }
        });
    }
    Ok(acc.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_are_null_safe() {
        assert_eq!(call_scalar("to_int", &[Value::Null]).unwrap(), Value::Null);
        assert_eq!(
            call_scalar("to_int", &[Value::Str("oops".into())]).unwrap(),
            Value::Null
        );
        assert_eq!(
            call_scalar("to_float", &[Value::Str("1.5".into())]).unwrap(),
            Value::Float(1.5)
        );
    }

    #[test]
    fn coalesce_and_ifnull() {
        assert_eq!(
            call_scalar("coalesce", &[Value::Null, Value::Null, Value::Int(3)]).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            call_scalar("coalesce", &[Value::Null, Value::Null]).unwrap(),
            Value::Null
        );
        assert_eq!(
            call_scalar("ifnull", &[Value::Null, Value::Int(0)]).unwrap(),
            Value::Int(0)
        );
    }

    #[test]
    fn aggregates_skip_nulls_and_default_to_null() {
        let vals = vec![Value::Int(10), Value::Null, Value::Int(20)];
        assert_eq!(aggregate("count", &vals).unwrap(), Value::Int(2));
        assert_eq!(aggregate("sum", &vals).unwrap(), Value::Int(30));
        assert_eq!(aggregate("avg", &vals).unwrap(), Value::Int(15));
        assert_eq!(aggregate("min", &vals).unwrap(), Value::Int(10));
        assert_eq!(aggregate("max", &vals).unwrap(), Value::Int(20));
        assert_eq!(aggregate("sum", &[Value::Null]).unwrap(), Value::Null);
        assert_eq!(aggregate("sum", &[]).unwrap(), Value::Null);
        assert_eq!(
            aggregate("list", &vals).unwrap(),
            Value::List(vals.clone()),
            "list keeps NULLs"
        );
    }

    #[test]
    fn abs_wraps_at_the_integer_minimum() {
        assert_eq!(
            call_scalar("abs", &[Value::Int(-5)]).unwrap(),
            Value::Int(5)
        );
        assert_eq!(
            call_scalar("abs", &[Value::Int(i64::MIN)]).unwrap(),
            Value::Int(i64::MIN)
        );
    }

    #[test]
    fn unknown_function_is_an_error() {
        assert!(call_scalar("no_such", &[Value::Int(1)]).is_err());
        assert!(aggregate("no_such", &[]).is_err());
    }
}
