// SQL-shaped query support: clause parsing, expression compilation and
// evaluation, and pipeline execution over record streams.

pub mod ast;
pub mod error;
pub mod execution;
pub mod expr;
pub mod imports;
pub mod parser;
pub mod warn;

// Re-export main API
pub use ast::ParsedQuery;
pub use error::{SqlError, SqlResult};
pub use execution::{OutputRow, PipelineEngine, Value};
pub use expr::{Evaluator, ExpressionEvaluator};
