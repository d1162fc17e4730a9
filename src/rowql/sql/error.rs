//! Error handling for the query pipeline.
//!
//! All pipeline operations return well-structured errors with enough context
//! to point at the failing clause, expression, or row. The taxonomy:
//!
//! - **Parse errors**: malformed clause structure or expression text,
//!   surfaced at query construction and never inside the engine
//! - **Import errors**: an IMPORTed module is not registered, surfaced at
//!   setup before any row is processed
//! - **Eval errors**: an expression failed during WHERE/SELECT/GROUP/ORDER
//!   evaluation; fatal everywhere except PARTIALS-mode select terms
//! - **Type errors**: non-null operands of incompatible types
//! - **Source/sink errors**: opening, reading, writing, or closing a source
//!   or destination failed; carries the offending path
//!
//! Warnings are not errors: they go through [`crate::rowql::sql::warn`] and
//! are only promoted to `SourceSink` errors when escalation is enabled.

use std::fmt;

/// Errors raised while parsing or executing a query.
#[derive(Debug, Clone)]
pub enum SqlError {
    /// Malformed clause structure or expression text, with an optional
    /// character position into the query text.
    ParseError {
        message: String,
        position: Option<usize>,
    },

    /// An IMPORTed module is not available in the registry.
    ImportError { module: String, message: String },

    /// An expression failed during pipeline evaluation. Carries the query
    /// text and the zero-based index of the row being processed, where one
    /// applies.
    EvalError {
        message: String,
        query: Option<String>,
        row: Option<usize>,
    },

    /// Runtime failure not tied to a single expression (division by zero
    /// inside the value layer, unsupported operations, internal limits).
    ExecutionError {
        message: String,
        query: Option<String>,
    },

    /// Non-null operands of incompatible types.
    TypeError {
        expected: String,
        actual: String,
        value: Option<String>,
    },

    /// Failure opening, reading, writing, or closing a source or sink.
    SourceSink { path: String, message: String },
}

impl fmt::Display for SqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlError::ParseError { message, position } => {
                if let Some(pos) = position {
                    write!(f, "parse error at position {}: {}", pos, message)
                } else {
                    write!(f, "parse error: {}", message)
                }
            }
            SqlError::ImportError { module, message } => {
                write!(f, "import error for module '{}': {}", module, message)
            }
            SqlError::EvalError {
                message,
                query,
                row,
            } => {
                write!(f, "evaluation error")?;
                if let Some(idx) = row {
                    write!(f, " at row {}", idx)?;
                }
                write!(f, ": {}", message)?;
                if let Some(q) = query {
                    write!(f, " (query: {})", q)?;
                }
                Ok(())
            }
            SqlError::ExecutionError { message, query } => {
                if let Some(q) = query {
                    write!(f, "execution error in '{}': {}", q, message)
                } else {
                    write!(f, "execution error: {}", message)
                }
            }
            SqlError::TypeError {
                expected,
                actual,
                value,
            } => {
                if let Some(val) = value {
                    write!(
                        f,
                        "type error: expected {}, got {} for value '{}'",
                        expected, actual, val
                    )
                } else {
                    write!(f, "type error: expected {}, got {}", expected, actual)
                }
            }
            SqlError::SourceSink { path, message } => {
                write!(f, "source/sink error for '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for SqlError {}

impl SqlError {
    /// Create a parse error with an optional position
    pub fn parse_error(message: impl Into<String>, position: Option<usize>) -> Self {
        SqlError::ParseError {
            message: message.into(),
            position,
        }
    }

    /// Create an import resolution error
    pub fn import_error(module: impl Into<String>, message: impl Into<String>) -> Self {
        SqlError::ImportError {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Create an evaluation error with row context
    pub fn eval_error(
        message: impl Into<String>,
        query: Option<String>,
        row: Option<usize>,
    ) -> Self {
        SqlError::EvalError {
            message: message.into(),
            query,
            row,
        }
    }

    /// Create an execution error
    pub fn execution_error(message: impl Into<String>, query: Option<String>) -> Self {
        SqlError::ExecutionError {
            message: message.into(),
            query,
        }
    }

    /// Create a type error
    pub fn type_error(
        expected: impl Into<String>,
        actual: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        SqlError::TypeError {
            expected: expected.into(),
            actual: actual.into(),
            value,
        }
    }

    /// Create a source/sink error for a path
    pub fn source_sink(path: impl Into<String>, message: impl Into<String>) -> Self {
        SqlError::SourceSink {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap an io::Error with the offending path
    pub fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        SqlError::SourceSink {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Attach query text and row index to an evaluation-stage failure.
    /// Errors that already carry row context keep it.
    pub fn with_row_context(self, query: &str, row: usize) -> Self {
        match self {
            SqlError::EvalError {
                message,
                query: q,
                row: r,
            } => SqlError::EvalError {
                message,
                query: q.or_else(|| Some(query.to_string())),
                row: r.or(Some(row)),
            },
            other => SqlError::EvalError {
                message: other.to_string(),
                query: Some(query.to_string()),
                row: Some(row),
            },
        }
    }
}

/// Result type for pipeline operations
pub type SqlResult<T> = Result<T, SqlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_row_and_query_context() {
        let err = SqlError::type_error("Int", "Str", Some("abc".into()))
            .with_row_context("SELECT x", 4);
        let text = err.to_string();
        assert!(text.contains("at row 4"), "{}", text);
        assert!(text.contains("SELECT x"), "{}", text);
    }

    #[test]
    fn with_row_context_keeps_existing_row() {
        let err = SqlError::eval_error("boom", None, Some(2)).with_row_context("Q", 9);
        match err {
            SqlError::EvalError { row, .. } => assert_eq!(row, Some(2)),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
