//! The concrete expression evaluator.
//!
//! Implements [`Evaluator`] for the supported subset. Evaluation is
//! NULL-safe throughout: operators absorb NULL before any type checking, so
//! a missing column flows through an entire expression as NULL instead of
//! erroring. Genuine type mismatches between non-null operands surface as
//! errors, which the engine turns fatal (or recovers to NULL under
//! PARTIALS).
//!
//! Aggregates are only meaningful in group scope: the argument expression is
//! re-evaluated against every member row and the results folded once per
//! finalized group. In row scope an aggregate call is an error.

use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::types::Value;
use crate::rowql::sql::expr::functions;
use crate::rowql::sql::expr::parser::parse_expression;
use crate::rowql::sql::expr::{BinaryOp, EvalContext, Evaluator, Expr, ExprHandle, Scope, UnaryOp};

/// Default evaluator for the built-in expression subset.
#[derive(Debug, Default)]
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    pub fn new() -> Self {
        ExpressionEvaluator
    }

    fn eval(&self, expr: &Expr, ctx: &EvalContext) -> SqlResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Column(name) => Ok(Self::resolve_column(name, ctx)),
            Expr::Unary { op, expr } => {
                let value = self.eval(expr, ctx)?;
                match op {
                    UnaryOp::Neg => value.negate(),
                    // NOT goes through truthiness, so NOT NULL is true:
                    // NULL coerces to false in boolean contexts.
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right, ctx),
            Expr::Member { base, field } => Ok(self.eval(base, ctx)?.get_member(field)),
            Expr::Call { module, name, args } => self.eval_call(module.as_deref(), name, args, ctx),
            Expr::Star => Err(SqlError::execution_error(
                "'*' is only valid as the argument of count()",
                None,
            )),
            Expr::Tuple(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item, ctx)?);
                }
                Ok(Value::List(values))
            }
        }
    }

    /// Column resolution: row scope reads the row's columns (missing ones
    /// are NULL, never an error); group scope resolves non-aggregate
    /// references against the group's first member row.
    fn resolve_column(name: &str, ctx: &EvalContext) -> Value {
        match ctx.scope {
            Scope::Row(row) => row.get_member(name),
            Scope::Group(members) => members
                .first()
                .map(|row| row.get_member(name))
                .unwrap_or(Value::Null),
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        ctx: &EvalContext,
    ) -> SqlResult<Value> {
        // AND/OR return an operand, not a coerced boolean, so NULL keeps
        // propagating: `NULL AND x` is NULL, `NULL OR x` is x.
        match op {
            BinaryOp::And => {
                let l = self.eval(left, ctx)?;
                if !l.is_truthy() {
                    return Ok(l);
                }
                return self.eval(right, ctx);
            }
            BinaryOp::Or => {
                let l = self.eval(left, ctx)?;
                if l.is_truthy() {
                    return Ok(l);
                }
                return self.eval(right, ctx);
            }
            _ => {}
        }
        let l = self.eval(left, ctx)?;
        let r = self.eval(right, ctx)?;
        match op {
            BinaryOp::Compare(cmp) => l.compare_op(cmp, &r),
            BinaryOp::In => l.is_member_of(&r),
            BinaryOp::NotIn => match l.is_member_of(&r)? {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Ok(other),
            },
            BinaryOp::BitOr => l.bitwise("|", &r),
            BinaryOp::BitXor => l.bitwise("^", &r),
            BinaryOp::BitAnd => l.bitwise("&", &r),
            BinaryOp::Shl => l.bitwise("<<", &r),
            BinaryOp::Shr => l.bitwise(">>", &r),
            BinaryOp::Add => l.add(&r),
            BinaryOp::Sub => l.subtract(&r),
            BinaryOp::Mul => l.multiply(&r),
            BinaryOp::Div => l.divide(&r),
            BinaryOp::Mod => l.modulo(&r),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn eval_call(
        &self,
        module: Option<&str>,
        name: &str,
        args: &[Expr],
        ctx: &EvalContext,
    ) -> SqlResult<Value> {
        if let Some(module_name) = module {
            let module = ctx.imports.get(module_name).ok_or_else(|| {
                SqlError::execution_error(
                    format!("module '{}' is not imported", module_name),
                    None,
                )
            })?;
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(self.eval(arg, ctx)?);
            }
            return module.call(name, &values);
        }

        if functions::is_aggregate(name) {
            return self.eval_aggregate(name, args, ctx);
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, ctx)?);
        }
        functions::call_scalar(name, &values)
    }

    fn eval_aggregate(&self, name: &str, args: &[Expr], ctx: &EvalContext) -> SqlResult<Value> {
        let members = match ctx.scope {
            Scope::Group(members) => members,
            Scope::Row(_) => {
                return Err(SqlError::execution_error(
                    format!("aggregate function '{}' requires GROUP BY", name),
                    None,
                ))
            }
        };

        // count(*) counts members directly, no per-member evaluation
        if name == "count" && matches!(args, [Expr::Star]) {
            return Ok(Value::Int(members.len() as i64));
        }

        let arg = match args {
            [arg] => arg,
            _ => {
                return Err(SqlError::execution_error(
                    format!("aggregate '{}' takes exactly one argument", name),
                    None,
                ))
            }
        };

        let mut values = Vec::with_capacity(members.len());
        for member in members {
            let member_ctx = EvalContext {
                scope: Scope::Row(member),
                imports: ctx.imports,
            };
            values.push(self.eval(arg, &member_ctx)?);
        }
        functions::aggregate(name, &values)
    }
}

impl Evaluator for ExpressionEvaluator {
    fn compile(&self, text: &str) -> SqlResult<ExprHandle> {
        let expr = parse_expression(text)?;
        Ok(ExprHandle {
            text: text.trim().to_string(),
            expr,
        })
    }

    fn evaluate(&self, handle: &ExprHandle, ctx: &EvalContext) -> SqlResult<Value> {
        self.eval(&handle.expr, ctx)
    }
}
