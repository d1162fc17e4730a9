//! Core pipeline data types.
//!
//! This module contains the fundamental data types used throughout the query
//! pipeline:
//! - [`Value`] - The value type system, including the absorbing SQL NULL
//! - [`OutputRow`] - The projected record format emitted by the pipeline
//!
//! NULL semantics follow SQL rather than Rust conventions: any arithmetic,
//! bitwise, or shift operation with `Value::Null` on either side yields
//! `Value::Null` and never errors, comparisons against NULL yield NULL (which
//! is falsy), and the null-safe conversion helpers recover conversion
//! failures to NULL instead of propagating them.

use crate::rowql::sql::error::SqlError;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A value flowing through the query pipeline.
///
/// Maps preserve insertion order so that `SELECT *` expands columns in the
/// order the source produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL. Absorbs every operator; falsy in boolean contexts.
    Null,
    /// Boolean value (true/false)
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Ordered list of values
    List(Vec<Value>),
    /// Ordered mapping from column name to value
    Map(Vec<(String, Value)>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Map(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Value {
    /// Returns the type name of this value for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "Str",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this value is numeric (Int or Float) and can
    /// participate in arithmetic without coercion from text.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// SQL truthiness: NULL is always false, numbers are true when nonzero,
    /// strings and collections are true when non-empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(v) => *v != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(fields) => !fields.is_empty(),
        }
    }

    /// Length of this value. NULL has length 0 by definition; lengths of
    /// scalars other than strings are a type error.
    pub fn len(&self) -> Result<i64, SqlError> {
        match self {
            Value::Null => Ok(0),
            Value::Str(s) => Ok(s.chars().count() as i64),
            Value::List(items) => Ok(items.len() as i64),
            Value::Map(fields) => Ok(fields.len() as i64),
            other => Err(SqlError::type_error(
                "Str, List, or Map",
                other.type_name(),
                Some(other.to_string()),
            )),
        }
    }

    /// Iterates over this value. NULL iterates as an empty sequence.
    pub fn iter_elements(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Value::Null => Box::new(std::iter::empty()),
            Value::List(items) => Box::new(items.iter()),
            other => Box::new(std::iter::once(other)),
        }
    }

    /// Member lookup (`row->field`). Lookups on NULL or on values without
    /// the member yield NULL, never an error.
    pub fn get_member(&self, name: &str) -> Value {
        match self {
            Value::Map(fields) => fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Walks a `->`-separated path of member lookups.
    pub fn get_path(&self, path: &[String]) -> Value {
        let mut current = self.clone();
        for segment in path {
            current = current.get_member(segment);
        }
        current
    }

    /// Replaces the value at a member path, extending the map as needed.
    /// Used by the EXPLODE fan-out to substitute one element of a nested
    /// list back into its row.
    pub fn with_path_replaced(&self, path: &[String], replacement: Value) -> Value {
        if path.is_empty() {
            return replacement;
        }
        match self {
            Value::Map(fields) => {
                let mut out = fields.clone();
                let mut found = false;
                for (k, v) in out.iter_mut() {
                    if k == &path[0] {
                        *v = v.with_path_replaced(&path[1..], replacement.clone());
                        found = true;
                        break;
                    }
                }
                if !found {
                    let tail = Value::Null.with_path_replaced(&path[1..], replacement);
                    out.push((path[0].clone(), tail));
                }
                Value::Map(out)
            }
            _ => {
                let tail = Value::Null.with_path_replaced(&path[1..], replacement);
                Value::Map(vec![(path[0].clone(), tail)])
            }
        }
    }

    /// Addition with NULL absorption, numeric promotion, and string
    /// concatenation.
    pub fn add(&self, other: &Value) -> Result<Value, SqlError> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
            (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
            (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + *b as f64)),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
            (Value::List(a), Value::List(b)) => {
                let mut out = a.clone();
                out.extend(b.iter().cloned());
                Ok(Value::List(out))
            }
            (a, b) => Err(Self::binary_type_error("+", a, b)),
        }
    }

    pub fn subtract(&self, other: &Value) -> Result<Value, SqlError> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_sub(*b))),
            (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 - b)),
            (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a - *b as f64)),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
            (a, b) => Err(Self::binary_type_error("-", a, b)),
        }
    }

    pub fn multiply(&self, other: &Value) -> Result<Value, SqlError> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_mul(*b))),
            (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 * b)),
            (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a * *b as f64)),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
            (a, b) => Err(Self::binary_type_error("*", a, b)),
        }
    }

    pub fn divide(&self, other: &Value) -> Result<Value, SqlError> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Int(a), Value::Int(b)) => {
                if *b == 0 {
                    Err(SqlError::execution_error("division by zero", None))
                } else if *a == i64::MIN && *b == -1 {
                    // the one Int/Int quotient that overflows
                    Ok(Value::Int(a.wrapping_div(*b)))
                } else if a % b == 0 {
                    Ok(Value::Int(a / b))
                } else {
                    Ok(Value::Float(*a as f64 / *b as f64))
                }
            }
            (Value::Int(a), Value::Float(b)) => Self::checked_float_div(*a as f64, *b),
            (Value::Float(a), Value::Int(b)) => Self::checked_float_div(*a, *b as f64),
            (Value::Float(a), Value::Float(b)) => Self::checked_float_div(*a, *b),
            (a, b) => Err(Self::binary_type_error("/", a, b)),
        }
    }

    pub fn modulo(&self, other: &Value) -> Result<Value, SqlError> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Int(a), Value::Int(b)) => {
                if *b == 0 {
                    Err(SqlError::execution_error("modulo by zero", None))
                } else {
                    Ok(Value::Int(a.wrapping_rem_euclid(*b)))
                }
            }
            (Value::Int(a), Value::Float(b)) => Ok(Value::Float((*a as f64).rem_euclid(*b))),
            (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a.rem_euclid(*b as f64))),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a.rem_euclid(*b))),
            (a, b) => Err(Self::binary_type_error("%", a, b)),
        }
    }

    /// Bitwise AND/OR/XOR and shifts, defined for integers, absorbing NULL.
    pub fn bitwise(&self, op: &str, other: &Value) -> Result<Value, SqlError> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(match op {
                "&" => a & b,
                "|" => a | b,
                "^" => a ^ b,
                "<<" => a.wrapping_shl(*b as u32),
                ">>" => a.wrapping_shr(*b as u32),
                _ => {
                    return Err(SqlError::execution_error(
                        format!("unknown bitwise operator '{}'", op),
                        None,
                    ))
                }
            })),
            (a, b) => Err(Self::binary_type_error(op, a, b)),
        }
    }

    pub fn negate(&self) -> Result<Value, SqlError> {
        match self {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
            Value::Float(v) => Ok(Value::Float(-v)),
            other => Err(SqlError::type_error(
                "numeric",
                other.type_name(),
                Some(other.to_string()),
            )),
        }
    }

    /// SQL comparison: NULL on either side yields NULL, never a boolean.
    /// Non-null operands of incomparable types are a type error.
    pub fn compare_op(&self, op: CompareOp, other: &Value) -> Result<Value, SqlError> {
        if self.is_null() || other.is_null() {
            return Ok(Value::Null);
        }
        let ordering = self.cmp_values(other)?;
        let result = match op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::LtEq => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::GtEq => ordering != Ordering::Less,
        };
        Ok(Value::Bool(result))
    }

    /// Total ordering between two non-null values, with numeric coercion
    /// between Int and Float. Used by ORDER BY and the comparison operators.
    pub fn cmp_values(&self, other: &Value) -> Result<Ordering, SqlError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Ok(Self::cmp_f64(*a, *b)),
            (Value::Int(a), Value::Float(b)) => Ok(Self::cmp_f64(*a as f64, *b)),
            (Value::Float(a), Value::Int(b)) => Ok(Self::cmp_f64(*a, *b as f64)),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    if x.is_null() || y.is_null() {
                        continue;
                    }
                    let ord = x.cmp_values(y)?;
                    if ord != Ordering::Equal {
                        return Ok(ord);
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            (a, b) => Err(SqlError::type_error(
                a.type_name(),
                b.type_name(),
                Some(format!("{} vs {}", a, b)),
            )),
        }
    }

    fn cmp_f64(a: f64, b: f64) -> Ordering {
        if a < b {
            Ordering::Less
        } else if a > b {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    fn checked_float_div(a: f64, b: f64) -> Result<Value, SqlError> {
        if b == 0.0 {
            Err(SqlError::execution_error("division by zero", None))
        } else {
            Ok(Value::Float(a / b))
        }
    }

    fn binary_type_error(op: &str, left: &Value, right: &Value) -> SqlError {
        SqlError::type_error(
            format!("operands supporting '{}'", op),
            format!("{} and {}", left.type_name(), right.type_name()),
            None,
        )
    }

    /// Membership test (`a IN b`). Membership against NULL is always false.
    /// Strings test substring containment; lists test element equality with
    /// NULL-safe comparison (NULL never matches).
    pub fn is_member_of(&self, container: &Value) -> Result<Value, SqlError> {
        match container {
            Value::Null => Ok(Value::Bool(false)),
            Value::List(items) => {
                if self.is_null() {
                    return Ok(Value::Bool(false));
                }
                for item in items {
                    if item.is_null() {
                        continue;
                    }
                    if self.cmp_values(item).map(|o| o == Ordering::Equal).unwrap_or(false) {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            Value::Str(haystack) => match self {
                Value::Null => Ok(Value::Bool(false)),
                Value::Str(needle) => Ok(Value::Bool(haystack.contains(needle.as_str()))),
                other => Err(SqlError::type_error(
                    "Str",
                    other.type_name(),
                    Some(other.to_string()),
                )),
            },
            other => Err(SqlError::type_error(
                "List or Str",
                other.type_name(),
                Some(other.to_string()),
            )),
        }
    }

    /// Null-safe integer conversion: NULL in yields NULL out, and a failed
    /// conversion is recovered to NULL instead of an error.
    pub fn to_int(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Int(i) => Value::Int(*i),
            Value::Float(v) => Value::Int(*v as i64),
            Value::Bool(b) => Value::Int(*b as i64),
            Value::Str(s) => match s.trim().parse::<i64>() {
                Ok(i) => Value::Int(i),
                Err(_) => Value::Null,
            },
            _ => Value::Null,
        }
    }

    /// Null-safe float conversion; failures recover to NULL.
    pub fn to_float(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Int(i) => Value::Float(*i as f64),
            Value::Float(v) => Value::Float(*v),
            Value::Bool(b) => Value::Float(*b as i64 as f64),
            Value::Str(s) => match s.trim().parse::<f64>() {
                Ok(v) => Value::Float(v),
                Err(_) => Value::Null,
            },
            _ => Value::Null,
        }
    }

    /// Null-safe string conversion.
    pub fn to_str_value(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            other => Value::Str(other.to_string()),
        }
    }

    /// Deterministic key string for grouping and DISTINCT. Tags each value
    /// with its type so that `1`, `1.0`, and `'1'` stay distinct keys, while
    /// NULL keys collapse into one bucket. String payloads (and map field
    /// names) carry a byte-length prefix, so a string containing a tuple or
    /// list separator cannot forge an encoding boundary.
    pub fn to_key_string(&self) -> String {
        match self {
            Value::Null => "N:".to_string(),
            Value::Bool(b) => format!("b:{}", b),
            Value::Int(i) => format!("i:{}", i),
            Value::Float(v) => format!("f:{}", v.to_bits()),
            Value::Str(s) => format!("s:{}:{}", s.len(), s),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_key_string()).collect();
                format!("l:[{}]", parts.join(","))
            }
            Value::Map(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{}:{}={}", k.len(), k, v.to_key_string()))
                    .collect();
                format!("m:{{{}}}", parts.join(","))
            }
        }
    }
}

/// Comparison operators over [`Value`], dispatched through
/// [`Value::compare_op`] so NULL absorption happens in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Visitor for deserializing Value from any JSON type. Deserializing
/// directly (rather than through serde_json::Value) preserves object key
/// order, which `SELECT *` depends on.
struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON value (null, bool, number, string, array, or object)")
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
        if v <= i64::MAX as u64 {
            Ok(Value::Int(v as i64))
        } else {
            Ok(Value::Float(v as f64))
        }
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Str(v.to_owned()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E> {
        Ok(Value::Str(v))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut fields = Vec::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            fields.push((key, value));
        }
        Ok(Value::Map(fields))
    }
}

/// One projected output record: an ordered mapping from synthesized or
/// aliased column names to values. Column count and naming are fixed once
/// the SELECT list is known.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub columns: Vec<(String, Value)>,
}

impl OutputRow {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        OutputRow { columns }
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn values(&self) -> Vec<&Value> {
        self.columns.iter().map(|(_, v)| v).collect()
    }

    /// Deterministic key over the value tuple, used by DISTINCT.
    pub fn value_key(&self) -> String {
        let parts: Vec<String> = self
            .columns
            .iter()
            .map(|(_, v)| v.to_key_string())
            .collect();
        parts.join("\u{1f}")
    }

    /// Converts this row into a map value, preserving column order.
    pub fn into_value(self) -> Value {
        Value::Map(self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_absorbs_arithmetic_both_sides() {
        let x = Value::Int(7);
        assert_eq!(Value::Null.add(&x).unwrap(), Value::Null);
        assert_eq!(x.add(&Value::Null).unwrap(), Value::Null);
        assert_eq!(Value::Null.subtract(&x).unwrap(), Value::Null);
        assert_eq!(x.subtract(&Value::Null).unwrap(), Value::Null);
        assert_eq!(Value::Null.multiply(&x).unwrap(), Value::Null);
        assert_eq!(x.multiply(&Value::Null).unwrap(), Value::Null);
        assert_eq!(Value::Null.divide(&x).unwrap(), Value::Null);
        assert_eq!(x.divide(&Value::Null).unwrap(), Value::Null);
        assert_eq!(Value::Null.modulo(&x).unwrap(), Value::Null);
        assert_eq!(x.modulo(&Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn null_absorbs_bitwise_and_shifts() {
        let x = Value::Int(3);
        for op in ["&", "|", "^", "<<", ">>"] {
            assert_eq!(Value::Null.bitwise(op, &x).unwrap(), Value::Null);
            assert_eq!(x.bitwise(op, &Value::Null).unwrap(), Value::Null);
        }
        assert_eq!(
            Value::Int(6).bitwise("&", &Value::Int(3)).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            Value::Int(1).bitwise("<<", &Value::Int(4)).unwrap(),
            Value::Int(16)
        );
    }

    #[test]
    fn null_comparisons_yield_null_not_bool() {
        for op in [
            CompareOp::Eq,
            CompareOp::NotEq,
            CompareOp::Lt,
            CompareOp::LtEq,
            CompareOp::Gt,
            CompareOp::GtEq,
        ] {
            assert_eq!(
                Value::Null.compare_op(op, &Value::Int(1)).unwrap(),
                Value::Null
            );
            assert_eq!(
                Value::Int(1).compare_op(op, &Value::Null).unwrap(),
                Value::Null
            );
            assert_eq!(
                Value::Null.compare_op(op, &Value::Null).unwrap(),
                Value::Null
            );
        }
    }

    #[test]
    fn null_is_falsy_has_length_zero_and_iterates_empty() {
        assert!(!Value::Null.is_truthy());
        assert_eq!(Value::Null.len().unwrap(), 0);
        assert_eq!(Value::Null.iter_elements().count(), 0);
    }

    #[test]
    fn membership_against_null_is_false() {
        assert_eq!(
            Value::Int(1).is_member_of(&Value::Null).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            Value::Null
                .is_member_of(&Value::List(vec![Value::Null, Value::Int(1)]))
                .unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn member_access_on_null_yields_null() {
        assert_eq!(Value::Null.get_member("anything"), Value::Null);
        let row = Value::Map(vec![("a".into(), Value::Int(1))]);
        assert_eq!(row.get_member("a"), Value::Int(1));
        assert_eq!(row.get_member("missing"), Value::Null);
    }

    #[test]
    fn conversions_propagate_null_and_recover_failures() {
        assert_eq!(Value::Null.to_int(), Value::Null);
        assert_eq!(Value::Null.to_float(), Value::Null);
        assert_eq!(Value::Null.to_str_value(), Value::Null);
        assert_eq!(Value::Str("abc".into()).to_int(), Value::Null);
        assert_eq!(Value::Str("abc".into()).to_float(), Value::Null);
        assert_eq!(Value::Str(" 42 ".into()).to_int(), Value::Int(42));
        assert_eq!(Value::Str("2.5".into()).to_float(), Value::Float(2.5));
        assert_eq!(Value::Int(9).to_str_value(), Value::Str("9".into()));
    }

    #[test]
    fn numeric_promotion_and_string_concat() {
        assert_eq!(
            Value::Int(2).add(&Value::Float(0.5)).unwrap(),
            Value::Float(2.5)
        );
        assert_eq!(
            Value::Str("ab".into()).add(&Value::Str("cd".into())).unwrap(),
            Value::Str("abcd".into())
        );
        assert_eq!(
            Value::Int(7).divide(&Value::Int(2)).unwrap(),
            Value::Float(3.5)
        );
        assert_eq!(
            Value::Int(6).divide(&Value::Int(2)).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn division_by_zero_is_an_error_for_non_null_operands() {
        assert!(Value::Int(1).divide(&Value::Int(0)).is_err());
        assert_eq!(
            Value::Null.divide(&Value::Int(0)).unwrap(),
            Value::Null,
            "NULL absorbs before the zero check"
        );
    }

    #[test]
    fn integer_extremes_wrap_instead_of_panicking() {
        let min = Value::Int(i64::MIN);
        assert_eq!(min.negate().unwrap(), Value::Int(i64::MIN));
        assert_eq!(min.divide(&Value::Int(-1)).unwrap(), Value::Int(i64::MIN));
        assert_eq!(min.modulo(&Value::Int(-1)).unwrap(), Value::Int(0));
        assert_eq!(
            Value::Int(i64::MAX).negate().unwrap(),
            Value::Int(-i64::MAX)
        );
    }

    #[test]
    fn key_strings_resist_separator_forgery() {
        // tuple separator inside a string payload
        let left = vec![Value::Str("a".into()), Value::Str("b\u{1f}s:c".into())];
        let right = vec![Value::Str("a\u{1f}s:b".into()), Value::Str("c".into())];
        let join = |vals: &[Value]| {
            vals.iter()
                .map(|v| v.to_key_string())
                .collect::<Vec<_>>()
                .join("\u{1f}")
        };
        assert_ne!(join(&left), join(&right));

        // list element separator inside a string payload
        assert_ne!(
            Value::List(vec![Value::Str("a,s:1:b".into())]).to_key_string(),
            Value::List(vec![Value::Str("a".into()), Value::Str("b".into())]).to_key_string()
        );

        // map field name containing the key/value delimiter
        assert_ne!(
            Value::Map(vec![("a=i".into(), Value::Int(1))]).to_key_string(),
            Value::Map(vec![("a".into(), Value::Str("i:1".into()))]).to_key_string()
        );
    }

    #[test]
    fn null_keys_share_a_key_string() {
        assert_eq!(Value::Null.to_key_string(), Value::Null.to_key_string());
        assert_ne!(
            Value::Int(1).to_key_string(),
            Value::Str("1".into()).to_key_string()
        );
        assert_ne!(
            Value::Int(1).to_key_string(),
            Value::Float(1.0).to_key_string()
        );
    }

    #[test]
    fn explode_path_replacement() {
        let row = Value::Map(vec![
            ("id".into(), Value::Int(1)),
            (
                "tags".into(),
                Value::List(vec![Value::Str("a".into()), Value::Str("b".into())]),
            ),
        ]);
        let replaced = row.with_path_replaced(&["tags".into()], Value::Str("a".into()));
        assert_eq!(replaced.get_member("tags"), Value::Str("a".into()));
        assert_eq!(replaced.get_member("id"), Value::Int(1));
    }

    #[test]
    fn json_roundtrip_preserves_map_order() {
        let json = r#"{"z":1,"a":null,"m":[1,2.5,"x"]}"#;
        let value: Value = serde_json::from_str(json).unwrap();
        match &value {
            Value::Map(fields) => {
                let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["z", "a", "m"]);
                assert_eq!(fields[1].1, Value::Null);
            }
            other => panic!("expected map, got {:?}", other),
        }
        let back = serde_json::to_string(&value).unwrap();
        assert_eq!(back, json);
    }
}
