//! CSV writer: header from the first row's column names, then one record
//! per row. Fields are quoted per RFC 4180 when they contain the
//! delimiter, a quote, or a line break. NULL becomes an empty field.

use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::types::{OutputRow, Value};
use crate::rowql::writer::Writer;
use std::io::Write as IoWrite;

pub struct CsvWriter {
    output: Box<dyn IoWrite>,
    name: String,
    unbuffered: bool,
    header_written: bool,
}

impl CsvWriter {
    pub fn new(output: Box<dyn IoWrite>, name: &str, unbuffered: bool) -> Self {
        CsvWriter {
            output,
            name: name.to_string(),
            unbuffered,
            header_written: false,
        }
    }

    fn write_record(&mut self, fields: &[String]) -> SqlResult<()> {
        let line = fields
            .iter()
            .map(|f| quote_field(f))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(self.output, "{}", line).map_err(|e| SqlError::io(&self.name, e))
    }
}

impl Writer for CsvWriter {
    fn write(&mut self, row: &OutputRow) -> SqlResult<()> {
        if !self.header_written {
            self.header_written = true;
            let names: Vec<String> = row.names().iter().map(|n| n.to_string()).collect();
            self.write_record(&names)?;
        }
        let fields: Vec<String> = row.values().iter().map(|v| field_text(v)).collect();
        self.write_record(&fields)?;
        if self.unbuffered {
            self.output.flush().map_err(|e| SqlError::io(&self.name, e))?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> SqlResult<()> {
        self.output.flush().map_err(|e| SqlError::io(&self.name, e))
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn quote_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rowql::writer::test_support::SharedBuf;

    fn render(rows: Vec<OutputRow>) -> String {
        let buffer = SharedBuf::new();
        let mut writer = CsvWriter::new(Box::new(buffer.clone()), "out.csv", false);
        for row in &rows {
            writer.write(row).unwrap();
        }
        writer.finalize().unwrap();
        buffer.contents()
    }

    #[test]
    fn header_then_rows_with_null_as_empty() {
        let out = render(vec![
            OutputRow::new(vec![
                ("a".to_string(), Value::Int(1)),
                ("b".to_string(), Value::Null),
            ]),
            OutputRow::new(vec![
                ("a".to_string(), Value::Int(2)),
                ("b".to_string(), Value::Str("x,y".to_string())),
            ]),
        ]);
        assert_eq!(out, "a,b\n1,\n2,\"x,y\"\n");
    }

    #[test]
    fn quotes_are_doubled() {
        let out = render(vec![OutputRow::new(vec![(
            "q".to_string(),
            Value::Str("say \"hi\"".to_string()),
        )])]);
        assert_eq!(out, "q\n\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn empty_result_writes_nothing() {
        assert_eq!(render(Vec::new()), "");
    }
}
