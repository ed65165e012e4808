//! Numeric comparison expressions for the `formula` rule
//!
//! An expression is `<left> <op> <right>` where both operands parse as
//! numbers and `op` is one of `>=`, `<=`, `>`, `<`, `==`, `!=`.

use crate::error::{FactError, Result};

/// Operators in match order: two-char forms first so `>=` is not read as `>`
const OPERATORS: [&str; 6] = [">=", "<=", ">", "<", "==", "!="];

/// Evaluate a comparison expression such as `"12 > 10"`
pub fn evaluate(expression: &str) -> Result<bool> {
    let expr = expression.trim();
    let fail = |reason: String| FactError::Formula {
        expression: expression.to_string(),
        reason,
    };

    let op = OPERATORS
        .iter()
        .copied()
        .find(|op| expr.contains(op))
        .ok_or_else(|| fail("no valid operator found in expression".to_string()))?;

    let parts: Vec<&str> = expr.split(op).collect();
    let [left, right] = parts.as_slice() else {
        return Err(fail("invalid expression format".to_string()));
    };

    let left: f64 = left
        .trim()
        .parse()
        .map_err(|e| fail(format!("invalid left operand: {}", e)))?;
    let right: f64 = right
        .trim()
        .parse()
        .map_err(|e| fail(format!("invalid right operand: {}", e)))?;

    Ok(match op {
        ">=" => left >= right,
        "<=" => left <= right,
        ">" => left > right,
        "<" => left < right,
        "==" => left == right,
        _ => left != right,
    })
}
