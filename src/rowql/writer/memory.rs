//! Memory writer: collects result rows into a value for the embedding
//! program. Used when the query has no TO clause and no output handle.

use crate::rowql::sql::error::SqlResult;
use crate::rowql::sql::execution::types::{OutputRow, Value};
use crate::rowql::writer::Writer;

#[derive(Default)]
pub struct MemoryWriter {
    rows: Vec<Value>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        MemoryWriter::default()
    }
}

impl Writer for MemoryWriter {
    fn write(&mut self, row: &OutputRow) -> SqlResult<()> {
        self.rows.push(row.clone().into_value());
        Ok(())
    }

    fn finalize(&mut self) -> SqlResult<()> {
        Ok(())
    }

    fn take_value(&mut self) -> Option<Value> {
        Some(Value::List(std::mem::take(&mut self.rows)))
    }
}
