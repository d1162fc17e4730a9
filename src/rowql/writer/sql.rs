//! SQL writer: one INSERT statement per result row, ready to replay into
//! a database.
//!
//! Strings are single-quoted with `''` escaping, NULL is the SQL keyword,
//! and composite values are embedded as their JSON text. Identifiers are
//! double-quoted.

use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::types::{OutputRow, Value};
use crate::rowql::writer::Writer;
use std::io::Write as IoWrite;

const DEFAULT_TABLE: &str = "table_name";

pub struct SqlInsertWriter {
    output: Box<dyn IoWrite>,
    name: String,
    table: String,
    unbuffered: bool,
}

impl SqlInsertWriter {
    pub fn new(
        output: Box<dyn IoWrite>,
        name: &str,
        table: Option<String>,
        unbuffered: bool,
    ) -> Self {
        SqlInsertWriter {
            output,
            name: name.to_string(),
            table: table.unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            unbuffered,
        }
    }
}

impl Writer for SqlInsertWriter {
    fn write(&mut self, row: &OutputRow) -> SqlResult<()> {
        let columns = row
            .names()
            .iter()
            .map(|n| format!("\"{}\"", n.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(",");
        let values = row
            .values()
            .iter()
            .map(|v| literal(v))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SqlError::source_sink(&self.name, e))?
            .join(",");
        writeln!(
            self.output,
            "INSERT INTO \"{}\"({}) VALUES ({});",
            self.table.replace('"', "\"\""),
            columns,
            values
        )
        .map_err(|e| SqlError::io(&self.name, e))?;
        if self.unbuffered {
            self.output.flush().map_err(|e| SqlError::io(&self.name, e))?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> SqlResult<()> {
        self.output.flush().map_err(|e| SqlError::io(&self.name, e))
    }
}

fn literal(value: &Value) -> Result<String, String> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Str(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
        composite => {
            let json = serde_json::to_string(composite).map_err(|e| e.to_string())?;
            Ok(format!("'{}'", json.replace('\'', "''")))
        }
    }
}
