//! Parsed query model.
//!
//! The immutable description of a pipeline produced by the clause parser and
//! consumed by the execution engine: select list, projection mode, from spec,
//! where handle, group-by handles, order-by terms, limit/offset window, to
//! spec, and imports. Expression handles are opaque to everything except the
//! evaluator that compiled them.

use crate::rowql::sql::expr::ExprHandle;

/// A complete parsed query. Built once at construction time and immutable
/// thereafter.
#[derive(Debug, Clone)]
pub struct ParsedQuery {
    /// Original query text, kept for error context
    pub query_text: String,
    /// IMPORT clause entries, resolved against the module registry at setup
    pub imports: Vec<ImportSpec>,
    /// Projection mode. DISTINCT and PARTIALS are mutually exclusive by
    /// construction: both are cases of this one enum.
    pub mode: SelectMode,
    /// SELECT list entries in declaration order
    pub select: Vec<SelectItem>,
    /// FROM clause, absent for queries over a single synthetic row
    pub from: Option<FromSpec>,
    /// WHERE predicate
    pub where_clause: Option<ExprHandle>,
    /// GROUP BY key expressions
    pub group_by: Vec<ExprHandle>,
    /// ORDER BY terms in priority order
    pub order_by: Vec<OrderByTerm>,
    /// LIMIT row count; `None` means unlimited
    pub limit: Option<usize>,
    /// OFFSET rows to skip before emitting
    pub offset: usize,
    /// TO clause, absent when results are returned to the caller
    pub to: Option<ToSpec>,
}

impl ParsedQuery {
    /// True when the pipeline can stop pulling from the source once
    /// `offset + limit` output rows exist. GROUP BY and ORDER BY force full
    /// materialization and disable the short-circuit.
    pub fn can_short_circuit(&self) -> bool {
        self.limit.is_some() && self.group_by.is_empty() && self.order_by.is_empty()
    }
}

/// One IMPORT entry: `IMPORT module [AS alias]`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    pub module: String,
    pub alias: Option<String>,
}

impl ImportSpec {
    /// Name under which the module's functions are reachable in expressions
    pub fn binding_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.module)
    }
}

/// Projection mode for the SELECT stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Emit every projected row
    All,
    /// Suppress rows whose value tuple was already emitted (first-seen
    /// order preserved)
    Distinct,
    /// Recover individual failing select terms to NULL instead of aborting
    Partials,
}

/// One entry of the SELECT list.
#[derive(Debug, Clone)]
pub enum SelectItem {
    /// `*`: expands to all current row columns in their existing order
    Star,
    /// An expression with an optional alias
    Term(SelectTerm),
}

#[derive(Debug, Clone)]
pub struct SelectTerm {
    pub expr: ExprHandle,
    pub alias: Option<String>,
}

/// FROM clause: where rows come from, plus the optional EXPLODE fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct FromSpec {
    pub kind: FromKind,
    /// `EXPLODE a->b->c` path, split on `->`
    pub explode: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FromKind {
    /// Explicit format keyword: read that format from the input handle
    Csv,
    Json,
    Text,
    /// Anything else: a filesystem path (reader chosen by extension) or the
    /// name of a data-source binding supplied at run time. Resolved by the
    /// query entry point, not the parser.
    Name(String),
}

/// One ORDER BY term.
#[derive(Debug, Clone)]
pub struct OrderByTerm {
    pub key: OrderKey,
    pub direction: OrderDirection,
    pub nulls: NullOrdering,
}

#[derive(Debug, Clone)]
pub enum OrderKey {
    /// 1-based output column reference, read from the projected row
    Column(usize),
    /// Expression evaluated in the same scope as the select terms
    Expr(ExprHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// Where NULL sort keys go. When the query text carries no NULLS directive
/// the parser resolves the default: last for ASC, first for DESC (NULLs
/// treated as largest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrdering {
    First,
    Last,
}

/// TO clause: output kind keyword or a destination path whose extension
/// selects the writer.
#[derive(Debug, Clone, PartialEq)]
pub enum ToSpec {
    Kind(OutputKind),
    Path(String),
}

/// The fixed set of output kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Columnar text with a header row
    Csv,
    /// Line-delimited JSON objects
    Json,
    /// INSERT statements
    Sql,
    /// Human-readable aligned table
    Pretty,
    /// Terminal bar chart of the first numeric column
    Plot,
}

impl OutputKind {
    /// Maps a TO keyword to an output kind.
    pub fn from_keyword(word: &str) -> Option<OutputKind> {
        match word.to_ascii_lowercase().as_str() {
            "csv" => Some(OutputKind::Csv),
            "json" => Some(OutputKind::Json),
            "sql" => Some(OutputKind::Sql),
            "pretty" => Some(OutputKind::Pretty),
            "plot" => Some(OutputKind::Plot),
            _ => None,
        }
    }
}
