//! Task result values
//!
//! Closed tagged union for everything a fact can produce, with total
//! conversions for the aggregate methods and the final numeric reduction.

use std::fmt;

use crate::error::{FactError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
    /// Raw fetched content (file body, HTTP body)
    Bytes(Vec<u8>),
    List(Vec<Value>),
}

impl Value {
    /// Variant name, used in errors and for type comparisons
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Decode a JSON value. Objects and null keep their JSON rendering as text.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or_default()),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            other @ (serde_json::Value::Null | serde_json::Value::Object(_)) => {
                Value::Text(other.to_string())
            }
        }
    }

    /// JSON rendering for CLI output
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::String(String::from_utf8_lossy(b).into_owned()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
        }
    }

    /// Reduce to a number: bool → 0/1, numeric text or bytes parsed, numbers as-is
    pub fn to_number(&self) -> Result<f64> {
        match self {
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => Ok(*n),
            Value::Text(s) => parse_number(s),
            Value::Bytes(b) => parse_number(&String::from_utf8_lossy(b)),
            Value::List(_) => Err(FactError::NotNumeric {
                value_type: "list",
                details: self.to_string(),
            }),
        }
    }

    /// Length of a list value
    pub fn count(&self) -> Result<usize> {
        match self {
            Value::List(items) => Ok(items.len()),
            other => Err(FactError::UnsupportedValue {
                method: "count",
                details: format!("expected a list, got {}", other.kind()),
            }),
        }
    }

    /// Numbers of a list value; every element must be a number
    pub fn as_numbers(&self) -> Result<Vec<f64>> {
        let Value::List(items) = self else {
            return Err(FactError::UnsupportedValue {
                method: "sum",
                details: format!("expected a list, got {}", self.kind()),
            });
        };
        items
            .iter()
            .map(|item| match item {
                Value::Number(n) => Ok(*n),
                other => Err(FactError::UnsupportedValue {
                    method: "sum",
                    details: format!("expected number, got {}", other.kind()),
                }),
            })
            .collect()
    }

    /// Booleans of a list value; a bare bool is a one-element list
    pub fn as_bools(&self, method: &'static str) -> Result<Vec<bool>> {
        match self {
            Value::Bool(b) => Ok(vec![*b]),
            Value::List(items) => items
                .iter()
                .map(|item| match item {
                    Value::Bool(b) => Ok(*b),
                    other => Err(FactError::UnsupportedValue {
                        method,
                        details: format!("expected bool, got {}", other.kind()),
                    }),
                })
                .collect(),
            other => Err(FactError::UnsupportedValue {
                method,
                details: format!("expected a list of bools, got {}", other.kind()),
            }),
        }
    }
}

fn parse_number(s: &str) -> Result<f64> {
    if s.is_empty() {
        return Err(FactError::NotNumeric {
            value_type: "text",
            details: "input string is empty".to_string(),
        });
    }
    s.trim().parse::<f64>().map_err(|e| FactError::NotNumeric {
        value_type: "text",
        details: format!("failed to parse {:?}: {}", s, e),
    })
}

/// Decimal exponent and mantissa digits of `n`, from Rust's shortest `{:e}` form
fn scientific(n: f64) -> (String, i32) {
    let sci = format!("{:e}", n);
    match sci.split_once('e') {
        Some((mantissa, exp)) => (mantissa.to_string(), exp.parse().unwrap_or(0)),
        None => (sci, 0),
    }
}

fn exponent_form(mantissa: &str, exp: i32, min_digits: usize) -> String {
    let sign = if exp < 0 { '-' } else { '+' };
    format!(
        "{}e{}{:0width$}",
        mantissa,
        sign,
        exp.unsigned_abs(),
        width = min_digits
    )
}

/// Shortest rendering with exponent form below 1e-4 and from 1e21 up
///
/// `3.0` → `3`, `1e21` → `1e+21`, `0.000001` → `1e-06`
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    let (mantissa, exp) = scientific(n);
    if n != 0.0 && (exp < -4 || exp >= 21) {
        exponent_form(&mantissa, exp, 2)
    } else {
        n.to_string()
    }
}

/// JSON encoding of a number: exponent form below 1e-6 and from 1e21 up
///
/// `3.0` → `3`, `1e21` → `1e+21`, `0.0000001` → `1e-7`
pub fn json_number(n: f64) -> Result<String> {
    if !n.is_finite() {
        return Err(FactError::InvalidJson {
            details: format!("unsupported number {}", format_number(n)),
        });
    }
    let abs = n.abs();
    if abs != 0.0 && (abs < 1e-6 || abs >= 1e21) {
        let (mantissa, exp) = scientific(n);
        Ok(exponent_form(&mantissa, exp, 1))
    } else {
        Ok(n.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
            Value::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}
