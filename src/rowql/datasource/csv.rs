//! CSV reader with header handling and scalar type inference.
//!
//! Parsing follows RFC 4180: fields separated by the configured delimiter,
//! double-quoted fields may contain delimiters, doubled quotes, and line
//! breaks. Each record becomes a map row; field text is inferred into
//! integers, floats, booleans, or NULL (empty field) before falling back to
//! a string.

use crate::rowql::datasource::RowSource;
use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::types::Value;
use std::io::BufRead;

#[derive(Debug, Clone)]
pub struct CsvSourceConfig {
    /// Field delimiter, a single byte character
    pub delimiter: char,
    /// Whether the first record names the columns
    pub has_header: bool,
}

impl Default for CsvSourceConfig {
    fn default() -> Self {
        CsvSourceConfig {
            delimiter: ',',
            has_header: true,
        }
    }
}

pub struct CsvSource {
    input: Box<dyn BufRead>,
    name: String,
    config: CsvSourceConfig,
    header: Option<Vec<String>>,
    started: bool,
}

impl CsvSource {
    pub fn new(input: Box<dyn BufRead>, name: &str, config: CsvSourceConfig) -> Self {
        CsvSource {
            input,
            name: name.to_string(),
            config,
            header: None,
            started: false,
        }
    }

    /// Reads one physical-or-logical record, extending across line breaks
    /// that fall inside a quoted field. `None` at end of input.
    fn read_record(&mut self) -> SqlResult<Option<Vec<String>>> {
        loop {
            let mut raw = String::new();
            loop {
                let read = self
                    .input
                    .read_line(&mut raw)
                    .map_err(|e| SqlError::io(&self.name, e))?;
                if read == 0 {
                    if raw.is_empty() {
                        return Ok(None);
                    }
                    break;
                }
                if !has_open_quote(&raw) {
                    break;
                }
            }
            while raw.ends_with('\n') || raw.ends_with('\r') {
                raw.pop();
            }
            if raw.is_empty() {
                // blank line between records
                continue;
            }
            return Ok(Some(split_fields(&raw, self.config.delimiter)));
        }
    }

    fn column_names(&mut self, width: usize) -> Vec<String> {
        match &self.header {
            Some(names) => {
                let mut names = names.clone();
                while names.len() < width {
                    names.push(format!("col{}", names.len() + 1));
                }
                names
            }
            None => (1..=width).map(|i| format!("col{}", i)).collect(),
        }
    }
}

impl RowSource for CsvSource {
    fn next_row(&mut self) -> SqlResult<Option<Value>> {
        if !self.started {
            self.started = true;
            if self.config.has_header {
                match self.read_record()? {
                    Some(fields) => self.header = Some(fields),
                    None => return Ok(None),
                }
            }
        }
        let fields = match self.read_record()? {
            Some(fields) => fields,
            None => return Ok(None),
        };
        let names = self.column_names(fields.len());
        let columns = names
            .into_iter()
            .zip(fields)
            .map(|(name, field)| (name, infer_scalar(&field)))
            .collect();
        Ok(Some(Value::Map(columns)))
    }
}

/// True while the record has an unterminated quoted field, meaning the next
/// physical line still belongs to it.
fn has_open_quote(text: &str) -> bool {
    let mut in_quotes = false;
    for ch in text.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
        }
    }
    in_quotes
}

/// Splits one record into fields, honoring quoting and doubled quotes.
fn split_fields(record: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = record.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == delimiter {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    fields.push(current);
    fields
}

/// Maps field text to a typed value: empty is NULL, then integer, float,
/// and boolean forms, falling back to the raw string.
fn infer_scalar(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = field.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = field.parse::<f64>() {
        return Value::Float(f);
    }
    match field {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::Str(field.to_string()),
    }
}
