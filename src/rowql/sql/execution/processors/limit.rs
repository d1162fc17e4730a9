//! OFFSET/LIMIT windowing, applied after every other stage.
//!
//! When neither GROUP BY nor ORDER BY forces materialization, the engine
//! consults [`LimitWindow::reached`] before pulling the next source row so
//! that `offset + limit` output rows bound the amount of input read.

use crate::rowql::sql::execution::types::OutputRow;

#[derive(Debug, Clone, Copy)]
pub struct LimitWindow {
    offset: usize,
    limit: Option<usize>,
}

impl LimitWindow {
    pub fn new(offset: usize, limit: Option<usize>) -> Self {
        LimitWindow { offset, limit }
    }

    /// True once enough output rows exist that pulling more input cannot
    /// change the emitted window. Never true without a LIMIT.
    pub fn reached(&self, produced: usize) -> bool {
        match self.limit {
            Some(limit) => produced >= self.offset.saturating_add(limit),
            None => false,
        }
    }

    /// Whether the `index`-th produced row (zero-based) falls inside the
    /// emitted window. Used on the streaming path.
    pub fn contains(&self, index: usize) -> bool {
        if index < self.offset {
            return false;
        }
        match self.limit {
            Some(limit) => index - self.offset < limit,
            None => true,
        }
    }

    /// Applies the window to a materialized result set.
    pub fn apply(&self, rows: Vec<OutputRow>) -> Vec<OutputRow> {
        rows.into_iter()
            .enumerate()
            .filter(|(i, _)| self.contains(*i))
            .map(|(_, row)| row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rowql::sql::execution::types::Value;

    fn rows(n: usize) -> Vec<OutputRow> {
        (0..n)
            .map(|i| OutputRow::new(vec![("i".to_string(), Value::Int(i as i64))]))
            .collect()
    }

    #[test]
    fn offset_two_limit_three() {
        let window = LimitWindow::new(2, Some(3));
        let out = window.apply(rows(6));
        let values: Vec<Value> = out.into_iter().map(|r| r.columns[0].1.clone()).collect();
        assert_eq!(values, vec![Value::Int(2), Value::Int(3), Value::Int(4)]);
    }

    #[test]
    fn limit_zero_is_empty_and_reached_immediately() {
        let window = LimitWindow::new(0, Some(0));
        assert!(window.apply(rows(10)).is_empty());
        assert!(window.reached(0));
    }

    #[test]
    fn offset_without_limit_never_short_circuits() {
        let window = LimitWindow::new(3, None);
        assert!(!window.reached(1_000_000));
        assert_eq!(window.apply(rows(5)).len(), 2);
    }

    #[test]
    fn reached_threshold_is_offset_plus_limit() {
        let window = LimitWindow::new(2, Some(3));
        assert!(!window.reached(4));
        assert!(window.reached(5));
    }
}
