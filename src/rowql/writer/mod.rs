//! Output writers: consumers of result rows on the far end of the
//! pipeline.
//!
//! Streaming writers (CSV, JSON, SQL) emit each row as it arrives;
//! buffering writers (pretty table, plot) hold rows until [`Writer::finalize`]
//! because their layout needs the whole result set. The memory writer
//! collects rows into a value for the embedding program instead of writing
//! anywhere.

pub mod csv;
pub mod json;
pub mod memory;
pub mod plot;
pub mod pretty;
pub mod sql;

pub use csv::CsvWriter;
pub use json::JsonLinesWriter;
pub use memory::MemoryWriter;
pub use plot::PlotWriter;
pub use pretty::PrettyWriter;
pub use sql::SqlInsertWriter;

use crate::rowql::sql::ast::OutputKind;
use crate::rowql::sql::error::SqlResult;
use crate::rowql::sql::execution::types::{OutputRow, Value};
use crate::rowql::sql::warn::WarningPolicy;
use std::io::Write as IoWrite;

/// Sink for result rows.
pub trait Writer {
    fn write(&mut self, row: &OutputRow) -> SqlResult<()>;

    /// Called exactly once after the last row. Buffering writers render
    /// here; streaming writers flush.
    fn finalize(&mut self) -> SqlResult<()>;

    /// Terminal value for sink-less runs. Only the memory writer returns
    /// one.
    fn take_value(&mut self) -> Option<Value> {
        None
    }
}

/// Resolves an output path's format by extension, warning (escalatable)
/// and defaulting to CSV when the extension is unrecognized.
pub fn kind_for_path(path: &str, warnings: &WarningPolicy) -> SqlResult<OutputKind> {
    let ext = path
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => Ok(OutputKind::Csv),
        "json" | "jsonl" | "ndjson" => Ok(OutputKind::Json),
        "sql" => Ok(OutputKind::Sql),
        _ => {
            warnings.warn(path, "unrecognized file extension, writing CSV")?;
            Ok(OutputKind::Csv)
        }
    }
}

/// Knobs shared by the concrete writers.
#[derive(Debug, Clone, Default)]
pub struct WriterOptions {
    /// Table name for the SQL writer; a built-in default when absent
    pub table_name: Option<String>,
    /// Flush after every row (streaming writers only; the buffering
    /// writers render at finalize regardless)
    pub unbuffered: bool,
}

/// Builds a writer of the given kind over an output handle. Sink-less
/// runs build a [`MemoryWriter`] directly instead.
pub fn open(
    kind: OutputKind,
    output: Box<dyn IoWrite>,
    name: &str,
    options: &WriterOptions,
) -> Box<dyn Writer> {
    match kind {
        OutputKind::Csv => Box::new(CsvWriter::new(output, name, options.unbuffered)),
        OutputKind::Json => Box::new(JsonLinesWriter::new(output, name, options.unbuffered)),
        OutputKind::Sql => Box::new(SqlInsertWriter::new(
            output,
            name,
            options.table_name.clone(),
            options.unbuffered,
        )),
        OutputKind::Pretty => Box::new(PrettyWriter::new(output, name)),
        OutputKind::Plot => Box::new(PlotWriter::new(output, name)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Cloneable in-memory sink: one clone goes into the writer under
    /// test, the other reads the rendered output back.
    #[derive(Clone, Default)]
    pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
