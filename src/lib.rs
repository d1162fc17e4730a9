//! # rowql
//!
//! SQL-shaped queries over row streams with NULL-safe value semantics.
//!
//! A query is one pipeline: `IMPORT ... SELECT ... FROM ... WHERE ...
//! GROUP BY ... ORDER BY ... LIMIT ... OFFSET ... TO ...`. Rows are read
//! lazily from CSV, JSON lines, or plain text (or from values bound by the
//! embedding program), filtered and projected with expressions in which
//! NULL absorbs instead of erroring, and written to CSV, JSON, SQL INSERT
//! statements, a pretty table, or a terminal plot.
//!
//! ## Quick start
//!
//! ```rust
//! use rowql::rowql::{run_query, Value};
//! use std::collections::HashMap;
//!
//! let data = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
//! let bindings = HashMap::from([("data".to_string(), data)]);
//! let out = run_query("SELECT col1 * 10 AS y FROM data WHERE col1 > 1", bindings).unwrap();
//! assert_eq!(
//!     out,
//!     Value::List(vec![
//!         Value::Map(vec![("y".to_string(), Value::Int(20))]),
//!         Value::Map(vec![("y".to_string(), Value::Int(30))]),
//!     ])
//! );
//! ```

pub mod rowql;
