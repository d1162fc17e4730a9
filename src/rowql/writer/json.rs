//! JSON lines writer: one JSON object per result row, columns in
//! projection order.

use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::types::OutputRow;
use crate::rowql::writer::Writer;
use std::io::Write as IoWrite;

pub struct JsonLinesWriter {
    output: Box<dyn IoWrite>,
    name: String,
    unbuffered: bool,
}

impl JsonLinesWriter {
    pub fn new(output: Box<dyn IoWrite>, name: &str, unbuffered: bool) -> Self {
        JsonLinesWriter {
            output,
            name: name.to_string(),
            unbuffered,
        }
    }
}

impl Writer for JsonLinesWriter {
    fn write(&mut self, row: &OutputRow) -> SqlResult<()> {
        let value = row.clone().into_value();
        let line = serde_json::to_string(&value)
            .map_err(|e| SqlError::source_sink(&self.name, e.to_string()))?;
        writeln!(self.output, "{}", line).map_err(|e| SqlError::io(&self.name, e))?;
        if self.unbuffered {
            self.output.flush().map_err(|e| SqlError::io(&self.name, e))?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> SqlResult<()> {
        self.output.flush().map_err(|e| SqlError::io(&self.name, e))
    }
}
