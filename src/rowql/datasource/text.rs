//! Plain-text reader: each input line becomes a one-column string row.

use crate::rowql::datasource::RowSource;
use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::types::Value;
use std::io::BufRead;

pub struct TextSource {
    input: Box<dyn BufRead>,
    name: String,
}

impl TextSource {
    pub fn new(input: Box<dyn BufRead>, name: &str) -> Self {
        TextSource {
            input,
            name: name.to_string(),
        }
    }
}

impl RowSource for TextSource {
    fn next_row(&mut self) -> SqlResult<Option<Value>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| SqlError::io(&self.name, e))?;
        if read == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(Value::Map(vec![(
            "col1".to_string(),
            Value::Str(line),
        )])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn lines_become_string_rows() {
        let mut src = TextSource::new(
            Box::new(Cursor::new("first\nsecond\n".to_string())),
            "test.txt",
        );
        assert_eq!(
            src.next_row().unwrap().unwrap(),
            Value::Map(vec![("col1".to_string(), Value::Str("first".to_string()))])
        );
        assert_eq!(
            src.next_row().unwrap().unwrap().get_member("col1"),
            Value::Str("second".to_string())
        );
        assert!(src.next_row().unwrap().is_none());
    }

    #[test]
    fn empty_line_is_an_empty_string_not_null() {
        let mut src = TextSource::new(Box::new(Cursor::new("\n".to_string())), "test.txt");
        assert_eq!(
            src.next_row().unwrap().unwrap().get_member("col1"),
            Value::Str(String::new())
        );
    }
}
