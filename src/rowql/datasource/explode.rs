//! EXPLODE: fans one input row out to one row per element of a nested
//! list, with the list member replaced by that element in each copy.
//!
//! Edge behavior: an empty list at the path yields nothing for that row; a
//! missing member or non-list value yields the row once with NULL at the
//! path.

use crate::rowql::datasource::RowSource;
use crate::rowql::sql::error::SqlResult;
use crate::rowql::sql::execution::types::Value;
use std::collections::VecDeque;

pub struct ExplodeSource {
    inner: Box<dyn RowSource>,
    path: Vec<String>,
    pending: VecDeque<Value>,
}

impl ExplodeSource {
    pub fn new(inner: Box<dyn RowSource>, path: Vec<String>) -> Self {
        ExplodeSource {
            inner,
            path,
            pending: VecDeque::new(),
        }
    }

    fn fan_out(&mut self, row: Value) {
        match row.get_path(&self.path) {
            Value::List(items) => {
                for item in items {
                    self.pending
                        .push_back(row.with_path_replaced(&self.path, item));
                }
            }
            _ => {
                self.pending
                    .push_back(row.with_path_replaced(&self.path, Value::Null));
            }
        }
    }
}

impl RowSource for ExplodeSource {
    fn next_row(&mut self) -> SqlResult<Option<Value>> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Ok(Some(row));
            }
            match self.inner.next_row()? {
                Some(row) => self.fan_out(row),
                None => return Ok(None),
            }
        }
    }
}
