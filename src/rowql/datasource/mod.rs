//! Row sources: lazy producers of input rows for the pipeline.
//!
//! The engine pulls one row at a time through [`RowSource`]; everything
//! here is synchronous and blocking. Concrete readers cover CSV, JSON
//! lines, and plain text; in-process bindings supply rows without I/O, and
//! [`explode::ExplodeSource`] wraps any source with the EXPLODE fan-out.

pub mod binding;
pub mod csv;
pub mod explode;
pub mod json;
pub mod text;

pub use binding::BindingSource;
pub use csv::{CsvSource, CsvSourceConfig};
pub use explode::ExplodeSource;
pub use json::JsonLinesSource;
pub use text::TextSource;

use crate::rowql::sql::error::SqlResult;
use crate::rowql::sql::execution::types::Value;
use crate::rowql::sql::warn::WarningPolicy;
use std::io::BufRead;

/// A lazy, finite-or-infinite sequence of input rows.
pub trait RowSource {
    /// Next row, or `None` at end of stream.
    fn next_row(&mut self) -> SqlResult<Option<Value>>;
}

/// Source formats selectable by FROM keyword or file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
    Text,
}

impl SourceFormat {
    /// Maps a file extension to a format. `None` for unknown extensions;
    /// the caller decides the fallback (and warns).
    pub fn from_extension(path: &str) -> Option<SourceFormat> {
        let ext = path.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "tsv" => Some(SourceFormat::Csv),
            "json" | "jsonl" | "ndjson" => Some(SourceFormat::Json),
            "txt" | "text" | "log" => Some(SourceFormat::Text),
            _ => None,
        }
    }

    /// Resolves a path's format, warning (escalatable) and defaulting to
    /// plain text when the extension is unrecognized.
    pub fn for_path(path: &str, warnings: &WarningPolicy) -> SqlResult<SourceFormat> {
        match Self::from_extension(path) {
            Some(format) => Ok(format),
            None => {
                warnings.warn(
                    path,
                    "unrecognized file extension, reading as plain text",
                )?;
                Ok(SourceFormat::Text)
            }
        }
    }

    /// Builds a reader for this format over an input handle.
    pub fn open(
        &self,
        input: Box<dyn BufRead>,
        name: &str,
        csv_config: CsvSourceConfig,
    ) -> Box<dyn RowSource> {
        match self {
            SourceFormat::Csv => Box::new(CsvSource::new(input, name, csv_config)),
            SourceFormat::Json => Box::new(JsonLinesSource::new(input, name)),
            SourceFormat::Text => Box::new(TextSource::new(input, name)),
        }
    }
}

/// Source for FROM-less queries: one synthetic empty row, so `SELECT 1+1`
/// evaluates exactly once.
pub struct SingleRowSource {
    spent: bool,
}

impl SingleRowSource {
    pub fn new() -> Self {
        SingleRowSource { spent: false }
    }
}

impl Default for SingleRowSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RowSource for SingleRowSource {
    fn next_row(&mut self) -> SqlResult<Option<Value>> {
        if self.spent {
            Ok(None)
        } else {
            self.spent = true;
            Ok(Some(Value::Map(Vec::new())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_mapping() {
        assert_eq!(SourceFormat::from_extension("a.csv"), Some(SourceFormat::Csv));
        assert_eq!(
            SourceFormat::from_extension("/tmp/x.jsonl"),
            Some(SourceFormat::Json)
        );
        assert_eq!(SourceFormat::from_extension("notes.log"), Some(SourceFormat::Text));
        assert_eq!(SourceFormat::from_extension("blob.dat"), None);
    }

    #[test]
    fn unknown_extension_falls_back_to_text_or_escalates() {
        let lenient = WarningPolicy::new(false);
        assert_eq!(
            SourceFormat::for_path("blob.dat", &lenient).unwrap(),
            SourceFormat::Text
        );
        let strict = WarningPolicy::new(true);
        assert!(SourceFormat::for_path("blob.dat", &strict).is_err());
    }

    #[test]
    fn single_row_source_yields_once() {
        let mut source = SingleRowSource::new();
        assert_eq!(source.next_row().unwrap(), Some(Value::Map(Vec::new())));
        assert_eq!(source.next_row().unwrap(), None);
        assert_eq!(source.next_row().unwrap(), None);
    }
}
