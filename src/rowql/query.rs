//! The query entry point: compile once, run against files, standard
//! streams, or in-process bindings.
//!
//! [`Query::new`] parses the query text and compiles every expression, so
//! syntax errors surface at construction and never at row time. [`Query::run`]
//! resolves the FROM and TO clauses into a concrete source and writer,
//! drives the pipeline, and returns the collected result for sink-less
//! queries.

use crate::rowql::datasource::{
    BindingSource, CsvSourceConfig, ExplodeSource, RowSource, SingleRowSource, SourceFormat,
};
use crate::rowql::sql::ast::{FromKind, OutputKind, ParsedQuery, ToSpec};
use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::engine::{PipelineEngine, RunResult};
use crate::rowql::sql::execution::types::Value;
use crate::rowql::sql::expr::ExpressionEvaluator;
use crate::rowql::sql::parser;
use crate::rowql::sql::warn::WarningPolicy;
use crate::rowql::writer::{self, MemoryWriter, Writer, WriterOptions};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write as IoWrite};
use std::path::Path;

/// Run-time knobs that are not part of the query text.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Input handle for format-keyword FROM clauses (`FROM csv` etc.);
    /// standard input when absent
    pub input_path: Option<String>,
    /// Destination for kind-keyword TO clauses (`TO json` etc.); standard
    /// output when absent
    pub output_path: Option<String>,
    /// CSV reader settings
    pub csv: CsvSourceConfig,
    /// Table name for the SQL writer
    pub sql_table: Option<String>,
    /// Flush streaming output after every row
    pub unbuffered: bool,
    /// Output kind to use when the query has no TO clause. With `None`
    /// the rows are collected and returned to the caller instead; the
    /// command line sets this so results always reach standard output.
    pub default_output: Option<OutputKind>,
    /// Promote warnings (extension fallbacks) to errors
    pub escalate_warnings: bool,
}

/// A compiled query, reusable across runs.
pub struct Query {
    parsed: ParsedQuery,
    evaluator: ExpressionEvaluator,
    options: QueryOptions,
}

impl Query {
    pub fn new(text: &str) -> SqlResult<Query> {
        Self::with_options(text, QueryOptions::default())
    }

    pub fn with_options(text: &str, options: QueryOptions) -> SqlResult<Query> {
        let evaluator = ExpressionEvaluator::new();
        let parsed = parser::parse(text, &evaluator)?;
        Ok(Query {
            parsed,
            evaluator,
            options,
        })
    }

    pub fn parsed(&self) -> &ParsedQuery {
        &self.parsed
    }

    /// Runs the pipeline once. `bindings` resolve `FROM name` clauses to
    /// in-process values; for queries without a TO clause the result rows
    /// come back in [`RunResult::value`].
    pub fn run(&self, mut bindings: HashMap<String, Value>) -> SqlResult<RunResult> {
        let warnings = WarningPolicy::new(self.options.escalate_warnings);
        let mut source = self.open_source(&mut bindings, &warnings)?;
        let mut writer = self.open_writer(&warnings)?;
        PipelineEngine::run(&self.parsed, source.as_mut(), &self.evaluator, writer.as_mut())
    }

    fn open_source(
        &self,
        bindings: &mut HashMap<String, Value>,
        warnings: &WarningPolicy,
    ) -> SqlResult<Box<dyn RowSource>> {
        let spec = match &self.parsed.from {
            Some(spec) => spec,
            None => return Ok(Box::new(SingleRowSource::new())),
        };
        let source: Box<dyn RowSource> = match &spec.kind {
            FromKind::Csv => self.open_format(SourceFormat::Csv)?,
            FromKind::Json => self.open_format(SourceFormat::Json)?,
            FromKind::Text => self.open_format(SourceFormat::Text)?,
            FromKind::Name(name) => {
                if let Some(value) = bindings.remove(name) {
                    Box::new(BindingSource::new(value))
                } else if Path::new(name).exists() {
                    let format = SourceFormat::for_path(name, warnings)?;
                    let file = File::open(name).map_err(|e| SqlError::io(name, e))?;
                    format.open(Box::new(BufReader::new(file)), name, self.options.csv.clone())
                } else {
                    return Err(SqlError::source_sink(
                        name,
                        "not a readable file and no binding with this name was supplied",
                    ));
                }
            }
        };
        Ok(match &spec.explode {
            Some(path) => Box::new(ExplodeSource::new(source, path.clone())),
            None => source,
        })
    }

    /// Opens the configured input handle for an explicit-format FROM.
    fn open_format(&self, format: SourceFormat) -> SqlResult<Box<dyn RowSource>> {
        let (handle, name): (Box<dyn BufRead>, &str) = match &self.options.input_path {
            Some(path) => {
                let file = File::open(path).map_err(|e| SqlError::io(path, e))?;
                (Box::new(BufReader::new(file)), path.as_str())
            }
            None => (Box::new(BufReader::new(io::stdin())), "stdin"),
        };
        Ok(format.open(handle, name, self.options.csv.clone()))
    }

    fn open_writer(&self, warnings: &WarningPolicy) -> SqlResult<Box<dyn Writer>> {
        let (kind, path) = match &self.parsed.to {
            None => match self.options.default_output {
                Some(kind) => (kind, self.options.output_path.clone()),
                None => return Ok(Box::new(MemoryWriter::new())),
            },
            Some(ToSpec::Kind(kind)) => (*kind, self.options.output_path.clone()),
            Some(ToSpec::Path(path)) => {
                (writer::kind_for_path(path, warnings)?, Some(path.clone()))
            }
        };
        let (handle, name): (Box<dyn IoWrite>, String) = match path {
            Some(path) => {
                let file = File::create(&path).map_err(|e| SqlError::io(&path, e))?;
                (Box::new(BufWriter::new(file)), path)
            }
            None => (Box::new(io::stdout()), "stdout".to_string()),
        };
        let writer_options = WriterOptions {
            table_name: self.options.sql_table.clone(),
            unbuffered: self.options.unbuffered,
        };
        Ok(writer::open(kind, handle, &name, &writer_options))
    }
}

/// One-shot helper: compile, run with bindings, return the collected rows.
pub fn run_query(text: &str, bindings: HashMap<String, Value>) -> SqlResult<Value> {
    let result = Query::new(text)?.run(bindings)?;
    Ok(result.value.unwrap_or(Value::List(Vec::new())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows_of(value: Value) -> Vec<Value> {
        match value {
            Value::List(rows) => rows,
            other => panic!("expected a list of rows, got {:?}", other),
        }
    }

    fn bind(name: &str, value: Value) -> HashMap<String, Value> {
        HashMap::from([(name.to_string(), value)])
    }

    #[test]
    fn end_to_end_filter_and_project() {
        let data = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let out = run_query(
            "SELECT col1 * 10 AS y FROM data WHERE col1 > 1",
            bind("data", data),
        )
        .unwrap();
        assert_eq!(
            rows_of(out),
            vec![
                Value::Map(vec![("y".to_string(), Value::Int(20))]),
                Value::Map(vec![("y".to_string(), Value::Int(30))]),
            ]
        );
    }

    #[test]
    fn fromless_query_evaluates_once() {
        let out = run_query("SELECT 1 + 1 AS two", HashMap::new()).unwrap();
        assert_eq!(
            rows_of(out),
            vec![Value::Map(vec![("two".to_string(), Value::Int(2))])]
        );
    }

    #[test]
    fn missing_binding_is_a_source_error() {
        let err = run_query("SELECT * FROM nowhere", HashMap::new()).unwrap_err();
        assert!(matches!(err, SqlError::SourceSink { .. }));
    }

    #[test]
    fn syntax_errors_surface_at_construction() {
        assert!(matches!(
            Query::new("SELECT FROM WHERE"),
            Err(SqlError::ParseError { .. })
        ));
    }

    #[test]
    fn group_order_limit_compose() {
        let rows = Value::List(vec![
            Value::Map(vec![
                ("k".to_string(), Value::Str("a".to_string())),
                ("v".to_string(), Value::Int(1)),
            ]),
            Value::Map(vec![
                ("k".to_string(), Value::Str("b".to_string())),
                ("v".to_string(), Value::Int(5)),
            ]),
            Value::Map(vec![
                ("k".to_string(), Value::Str("a".to_string())),
                ("v".to_string(), Value::Int(3)),
            ]),
        ]);
        let out = run_query(
            "SELECT k, sum(v) AS total FROM rows GROUP BY 1 ORDER BY 2 DESC LIMIT 1",
            bind("rows", rows),
        )
        .unwrap();
        assert_eq!(
            rows_of(out),
            vec![Value::Map(vec![
                ("k".to_string(), Value::Str("b".to_string())),
                ("total".to_string(), Value::Int(5)),
            ])]
        );
    }
}
