//! The pipeline execution engine.
//!
//! Pull-based and single-threaded: rows are requested one at a time from
//! the source and driven synchronously through
//! WHERE → SELECT/DISTINCT/PARTIALS → GROUP BY → ORDER BY → OFFSET/LIMIT →
//! dispatch. Output order equals filtered input order unless ORDER BY says
//! otherwise. GROUP BY and ORDER BY force full materialization; everything
//! else streams with O(1) auxiliary memory per row, and a LIMIT without
//! either stops pulling from the source once `offset + limit` output rows
//! exist.
//!
//! Failure semantics: WHERE, group-key, and order-key evaluation failures
//! are always fatal and carry the query text plus the failing row index.
//! Select-term failures are fatal too, except under PARTIALS where the
//! failing column is recovered to NULL.

use crate::rowql::datasource::RowSource;
use crate::rowql::sql::ast::{OrderByTerm, OrderKey, ParsedQuery};
use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::processors::{sort_rows, GroupBuffer, LimitWindow, Projector};
use crate::rowql::sql::execution::types::{OutputRow, Value};
use crate::rowql::sql::expr::{EvalContext, Evaluator};
use crate::rowql::sql::imports::ImportBindings;
use crate::rowql::writer::Writer;

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct RunResult {
    /// Rows handed to the writer, after windowing
    pub rows_emitted: usize,
    /// Terminal value for queries without a sink (collected by the memory
    /// writer and returned to the caller instead of being written out)
    pub value: Option<Value>,
}

/// Stateless engine: all run state lives on the stack of [`run`].
pub struct PipelineEngine;

impl PipelineEngine {
    /// Drives one query over one source to one writer.
    pub fn run(
        query: &ParsedQuery,
        source: &mut dyn RowSource,
        evaluator: &dyn Evaluator,
        writer: &mut dyn Writer,
    ) -> SqlResult<RunResult> {
        // Import resolution happens before any row is read.
        let imports = ImportBindings::resolve(&query.imports)?;
        let window = LimitWindow::new(query.offset, query.limit);
        let mut projector = Projector::new(&query.select, query.mode, evaluator);

        let rows_emitted = if query.group_by.is_empty() {
            Self::run_streaming(
                query,
                source,
                evaluator,
                writer,
                &imports,
                &window,
                &mut projector,
            )?
        } else {
            Self::run_grouped(
                query,
                source,
                evaluator,
                writer,
                &imports,
                &window,
                &mut projector,
            )?
        };

        writer.finalize()?;
        Ok(RunResult {
            rows_emitted,
            value: writer.take_value(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn run_streaming(
        query: &ParsedQuery,
        source: &mut dyn RowSource,
        evaluator: &dyn Evaluator,
        writer: &mut dyn Writer,
        imports: &ImportBindings,
        window: &LimitWindow,
        projector: &mut Projector,
    ) -> SqlResult<usize> {
        let ordered = !query.order_by.is_empty();
        let mut materialized: Vec<(OutputRow, Vec<Value>)> = Vec::new();
        let mut produced = 0usize;
        let mut emitted = 0usize;
        let mut row_index = 0usize;

        loop {
            if query.can_short_circuit() && window.reached(produced) {
                break;
            }
            let row = match source.next_row()? {
                Some(row) => row,
                None => break,
            };
            let current = row_index;
            row_index += 1;

            let ctx = EvalContext::row(&row, imports);
            if !Self::passes_where(query, evaluator, &ctx, current)? {
                continue;
            }

            let out = match projector
                .project(&ctx)
                .map_err(|e| e.with_row_context(&query.query_text, current))?
            {
                Some(out) => out,
                None => continue, // DISTINCT suppressed
            };

            if ordered {
                let keys = Self::sort_keys(&query.order_by, &out, &ctx, evaluator)
                    .map_err(|e| e.with_row_context(&query.query_text, current))?;
                materialized.push((out, keys));
            } else {
                let index = produced;
                produced += 1;
                if window.contains(index) {
                    writer.write(&out)?;
                    emitted += 1;
                }
            }
        }

        if ordered {
            let sorted = sort_rows(materialized, &query.order_by)?;
            for row in window.apply(sorted) {
                writer.write(&row)?;
                emitted += 1;
            }
        }
        Ok(emitted)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_grouped(
        query: &ParsedQuery,
        source: &mut dyn RowSource,
        evaluator: &dyn Evaluator,
        writer: &mut dyn Writer,
        imports: &ImportBindings,
        window: &LimitWindow,
        projector: &mut Projector,
    ) -> SqlResult<usize> {
        let ordered = !query.order_by.is_empty();
        let mut buffer = GroupBuffer::new(&query.group_by, evaluator);
        let mut row_index = 0usize;

        while let Some(row) = source.next_row()? {
            let current = row_index;
            row_index += 1;
            {
                let ctx = EvalContext::row(&row, imports);
                if !Self::passes_where(query, evaluator, &ctx, current)? {
                    continue;
                }
            }
            buffer
                .add(row, imports)
                .map_err(|e| e.with_row_context(&query.query_text, current))?;
        }

        // Source exhausted: each group becomes exactly one result row, with
        // aggregate expressions seeing the full member collection.
        let groups = buffer.into_groups();
        let mut results: Vec<(OutputRow, Vec<Value>)> = Vec::new();
        for (group_index, members) in groups.iter().enumerate() {
            let ctx = EvalContext::group(members, imports);
            let out = match projector
                .project(&ctx)
                .map_err(|e| e.with_row_context(&query.query_text, group_index))?
            {
                Some(out) => out,
                None => continue,
            };
            let keys = if ordered {
                Self::sort_keys(&query.order_by, &out, &ctx, evaluator)
                    .map_err(|e| e.with_row_context(&query.query_text, group_index))?
            } else {
                Vec::new()
            };
            results.push((out, keys));
        }

        let rows = if ordered {
            sort_rows(results, &query.order_by)?
        } else {
            results.into_iter().map(|(row, _)| row).collect()
        };

        let mut emitted = 0usize;
        for row in window.apply(rows) {
            writer.write(&row)?;
            emitted += 1;
        }
        Ok(emitted)
    }

    /// WHERE: a failing predicate is fatal (no recovery mode for
    /// filtering); a NULL or otherwise falsy result drops the row.
    fn passes_where(
        query: &ParsedQuery,
        evaluator: &dyn Evaluator,
        ctx: &EvalContext,
        row_index: usize,
    ) -> SqlResult<bool> {
        match &query.where_clause {
            Some(predicate) => {
                let keep = evaluator
                    .evaluate(predicate, ctx)
                    .map_err(|e| e.with_row_context(&query.query_text, row_index))?;
                Ok(keep.is_truthy())
            }
            None => Ok(true),
        }
    }

    /// One sort key per ORDER BY term. Column-number keys read the
    /// projected row; expression keys are evaluated in the row or group
    /// context while it is still alive.
    fn sort_keys(
        terms: &[OrderByTerm],
        out: &OutputRow,
        ctx: &EvalContext,
        evaluator: &dyn Evaluator,
    ) -> SqlResult<Vec<Value>> {
        let mut keys = Vec::with_capacity(terms.len());
        for term in terms {
            let key = match &term.key {
                OrderKey::Column(n) => out
                    .columns
                    .get(n - 1)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| {
                        SqlError::execution_error(
                            format!("ORDER BY column {} is out of range", n),
                            None,
                        )
                    })?,
                OrderKey::Expr(handle) => evaluator.evaluate(handle, ctx)?,
            };
            keys.push(key);
        }
        Ok(keys)
    }
}
