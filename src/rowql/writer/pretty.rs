//! Pretty writer: buffers the whole result and renders an aligned text
//! table at finalize, when every column width is known.

use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::types::{OutputRow, Value};
use crate::rowql::writer::Writer;
use std::io::Write as IoWrite;

pub struct PrettyWriter {
    output: Box<dyn IoWrite>,
    name: String,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl PrettyWriter {
    pub fn new(output: Box<dyn IoWrite>, name: &str) -> Self {
        PrettyWriter {
            output,
            name: name.to_string(),
            header: Vec::new(),
            rows: Vec::new(),
        }
    }
}

impl Writer for PrettyWriter {
    fn write(&mut self, row: &OutputRow) -> SqlResult<()> {
        if self.header.is_empty() {
            self.header = row.names().iter().map(|n| n.to_string()).collect();
        }
        self.rows
            .push(row.values().iter().map(|v| cell_text(v)).collect());
        Ok(())
    }

    fn finalize(&mut self) -> SqlResult<()> {
        if self.header.is_empty() {
            return Ok(());
        }
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }
        let io = |e| SqlError::io(&self.name, e);
        writeln!(self.output, "{}", format_line(&self.header, &widths)).map_err(io)?;
        writeln!(self.output, "{}", separator(&widths)).map_err(io)?;
        for row in &self.rows {
            writeln!(self.output, "{}", format_line(row, &widths)).map_err(io)?;
        }
        self.output.flush().map_err(io)
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        line.push_str(cell);
        for _ in cell.chars().count()..*width {
            line.push(' ');
        }
    }
    line.trim_end().to_string()
}

fn separator(widths: &[usize]) -> String {
    widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("  ")
}
