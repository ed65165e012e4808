//! Aggregator - reduces dependency results for `aggregate` tasks
//!
//! Two passes through the same combiner: each dependency's result is
//! reduced to a partial, then the list of partials is reduced again.
//! `sum` of `[1, 2]` and `[3, 4]` gives partials `3` and `7`, then `10`.

use std::sync::Arc;

use super::task::Task;
use crate::ast::Method;
use crate::error::{FactError, Result};
use crate::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn combine(&self, task: &Task, deps: &[Arc<Task>]) -> Result<Option<Value>> {
        let method = task.fact().method.ok_or_else(|| FactError::UnknownMethod {
            method: "(none)".to_string(),
        })?;

        let partials = deps
            .iter()
            .map(|dep| {
                let result = dep.result().ok_or(FactError::DependencyResultMissing)?;
                combine_value(method, result)
            })
            .collect::<Result<Vec<_>>>()?;

        combine_value(method, &Value::List(partials)).map(Some)
    }
}

/// One pass of `method` over a value
pub fn combine_value(method: Method, value: &Value) -> Result<Value> {
    match method {
        Method::Count => value.count().map(|n| Value::Number(n as f64)),
        Method::Sum => value.as_numbers().map(|ns| Value::Number(ns.iter().sum())),
        Method::And => value.as_bools("and").map(|bs| Value::Bool(bs.iter().all(|b| *b))),
        Method::Or => value.as_bools("or").map(|bs| Value::Bool(bs.iter().any(|b| *b))),
        Method::Unknown => Err(FactError::UnknownMethod {
            method: method.to_string(),
        }),
    }
}
