//! Fail-closed evaluation of condition expressions.

use super::ast::{CmpOp, Expr};
use super::parser::parse;
use serde_json::Value;

/// Evaluation can fail on unresolved references or type mismatches; the
/// public [`evaluate`] entry point absorbs every failure as `false`.
enum EvalError {
    UnresolvedPath,
    TypeMismatch,
}

/// Evaluate a boolean expression against a read-only JSON context.
///
/// Fail-closed: parse errors, unresolved dotted-path references, and type
/// mismatches (e.g. a numeric comparison against a string) all yield
/// `false`. The function never panics and never returns an error, which is
/// what lets the executor treat a bad condition as "skip this action" rather
/// than "abort the chain".
pub fn evaluate(expression: &str, context: &Value) -> bool {
    match parse(expression) {
        Ok(expr) => eval_expr(&expr, context).unwrap_or(false),
        Err(_) => false,
    }
}

fn eval_expr(expr: &Expr, context: &Value) -> Result<bool, EvalError> {
    match expr {
        // Both sides evaluate strictly: an unresolved reference anywhere in
        // the expression fails it, even when the other side would decide it
        Expr::And(left, right) => {
            let a = eval_expr(left, context)?;
            let b = eval_expr(right, context)?;
            Ok(a && b)
        }
        Expr::Or(left, right) => {
            let a = eval_expr(left, context)?;
            let b = eval_expr(right, context)?;
            Ok(a || b)
        }
        Expr::Not(inner) => Ok(!eval_expr(inner, context)?),
        Expr::Cmp(op, left, right) => eval_cmp(*op, left, right, context),
        // A bare operand used as a condition is tested for truthiness
        other => Ok(truthy(&resolve_operand(other, context)?)),
    }
}

fn eval_cmp(op: CmpOp, left: &Expr, right: &Expr, context: &Value) -> Result<bool, EvalError> {
    let lhs = resolve_operand(left, context)?;
    let rhs = resolve_operand(right, context)?;

    match op {
        CmpOp::Eq => Ok(values_equal(&lhs, &rhs)),
        CmpOp::Ne => Ok(!values_equal(&lhs, &rhs)),
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
            let (a, b) = match (lhs.as_f64(), rhs.as_f64()) {
                (Some(a), Some(b)) => (a, b),
                // Ordering is defined for numbers only
                _ => return Err(EvalError::TypeMismatch),
            };
            Ok(match op {
                CmpOp::Lt => a < b,
                CmpOp::Le => a <= b,
                CmpOp::Gt => a > b,
                CmpOp::Ge => a >= b,
                CmpOp::Eq | CmpOp::Ne => unreachable!(),
            })
        }
    }
}

/// Resolve an operand expression to a JSON value. Paths must resolve;
/// nested boolean expressions are not valid operands in this grammar.
fn resolve_operand(expr: &Expr, context: &Value) -> Result<Value, EvalError> {
    match expr {
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Num(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .ok_or(EvalError::TypeMismatch),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Null => Ok(Value::Null),
        Expr::Path(segments) => lookup(segments, context).ok_or(EvalError::UnresolvedPath),
        _ => Err(EvalError::TypeMismatch),
    }
}

/// Navigate dotted-path segments through nested objects. Traversal through
/// a non-object (or a missing key) resolves to nothing.
fn lookup(segments: &[String], context: &Value) -> Option<Value> {
    let mut current = context;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current.clone())
}

fn values_equal(a: &Value, b: &Value) -> bool {
    // Numbers compare by value so that 1 == 1.0
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x == y;
    }
    a == b
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
