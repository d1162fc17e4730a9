//! JSON lines reader: one JSON value per input line.
//!
//! Objects keep their key order through the deserializer, so `SELECT *`
//! over JSON input reproduces the input column order.

use crate::rowql::datasource::RowSource;
use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::types::Value;
use std::io::BufRead;

pub struct JsonLinesSource {
    input: Box<dyn BufRead>,
    name: String,
    line_number: usize,
}

impl JsonLinesSource {
    pub fn new(input: Box<dyn BufRead>, name: &str) -> Self {
        JsonLinesSource {
            input,
            name: name.to_string(),
            line_number: 0,
        }
    }
}

impl RowSource for JsonLinesSource {
    fn next_row(&mut self) -> SqlResult<Option<Value>> {
        loop {
            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(|e| SqlError::io(&self.name, e))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(trimmed).map_err(|e| {
                SqlError::source_sink(
                    &self.name,
                    format!("invalid JSON on line {}: {}", self.line_number, e),
                )
            })?;
            return Ok(Some(value));
        }
    }
}
