//! Expression subset: AST, compiler, and evaluator.
//!
//! The pipeline engine never looks inside an expression; it holds an opaque
//! [`ExprHandle`] and calls through the [`Evaluator`] trait. The concrete
//! [`ExpressionEvaluator`] shipped here implements the documented subset
//! (literals, column references, arithmetic/comparison/boolean operators,
//! `->` member access, scalar builtins, aggregates, and imported module
//! functions). Anything outside the subset is rejected at compile time.

pub mod evaluator;
pub mod functions;
pub mod parser;

pub use evaluator::ExpressionEvaluator;

use crate::rowql::sql::error::SqlResult;
use crate::rowql::sql::execution::types::{CompareOp, Value};
use crate::rowql::sql::imports::ImportBindings;

/// Opaque compiled expression. Owned by the parsed query model, produced and
/// consumed only by the evaluator that compiled it.
#[derive(Debug, Clone)]
pub struct ExprHandle {
    /// Original expression text, kept for error context
    pub text: String,
    pub(crate) expr: Expr,
}

impl ExprHandle {
    /// Integer literal shortcut: `ORDER BY 2` and `GROUP BY 2` address an
    /// output column by position rather than evaluating an expression.
    pub fn as_column_number(&self) -> Option<usize> {
        match &self.expr {
            Expr::Literal(Value::Int(n)) if *n >= 1 => Some(*n as usize),
            _ => None,
        }
    }
}

/// Expression AST for the supported subset.
#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Literal(Value),
    Column(String),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `base->field` member access
    Member {
        base: Box<Expr>,
        field: String,
    },
    /// Builtin, aggregate, or imported function call
    Call {
        module: Option<String>,
        name: String,
        args: Vec<Expr>,
    },
    /// `*`, valid only as the sole argument of `count`
    Star,
    /// `(e1, e2, ...)` list literal, used with IN
    Tuple(Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Or,
    And,
    Compare(CompareOp),
    In,
    NotIn,
    BitOr,
    BitXor,
    BitAnd,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Evaluation scope: either one row or a finalized group's member rows.
/// Group scope is what makes deferred aggregate evaluation possible; a
/// non-aggregate subexpression in group scope resolves columns against the
/// group's first member row.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    Row(&'a Value),
    Group(&'a [Value]),
}

/// Context handed to the evaluator for each evaluation: the scope plus the
/// resolved IMPORT bindings.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub scope: Scope<'a>,
    pub imports: &'a ImportBindings,
}

impl<'a> EvalContext<'a> {
    pub fn row(row: &'a Value, imports: &'a ImportBindings) -> Self {
        EvalContext {
            scope: Scope::Row(row),
            imports,
        }
    }

    pub fn group(members: &'a [Value], imports: &'a ImportBindings) -> Self {
        EvalContext {
            scope: Scope::Group(members),
            imports,
        }
    }
}

/// The pluggable evaluator boundary. The engine depends only on this trait;
/// swapping the expression language means swapping this implementation.
pub trait Evaluator {
    /// Compiles expression text into an opaque handle. Fails with a parse
    /// error at query construction time, never during a run.
    fn compile(&self, text: &str) -> SqlResult<ExprHandle>;

    /// Evaluates a compiled handle against a row or group context.
    fn evaluate(&self, handle: &ExprHandle, ctx: &EvalContext) -> SqlResult<Value>;
}
