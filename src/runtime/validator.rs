//! Validator - boolean rules for `validate` tasks
//!
//! One dependency: the rule runs against its result (per element for lists).
//! Several dependencies: only `deps_match` compares them; other rules produce nothing.

use std::sync::Arc;

use regex::Regex;

use super::task::Task;
use crate::ast::{Fact, Rule};
use crate::error::{FactError, Result};
use crate::util::formula;
use crate::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

/// A per-value rule, compiled once per task
enum Check<'a> {
    Regex(Regex),
    Formula(&'a str),
}

impl<'a> Check<'a> {
    fn compile(fact: &'a Fact) -> Result<Self> {
        match fact.rule {
            Some(Rule::RegexMatch) => Regex::new(&fact.pattern)
                .map(Check::Regex)
                .map_err(|e| FactError::InvalidPattern {
                    pattern: fact.pattern.clone(),
                    reason: e.to_string(),
                }),
            Some(Rule::Formula) => Ok(Check::Formula(&fact.pattern)),
            other => Err(FactError::UnknownRule {
                rule: other.map_or_else(|| "(none)".to_string(), |r| r.to_string()),
            }),
        }
    }

    fn apply(&self, value: &Value) -> Result<bool> {
        let rendered = value.to_string();
        match self {
            Check::Regex(re) => Ok(re.is_match(&rendered)),
            Check::Formula(pattern) => formula::evaluate(&format!("{} {}", rendered, pattern)),
        }
    }
}

impl Validator {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, task: &Task, deps: &[Arc<Task>]) -> Result<Option<Value>> {
        match deps {
            [] => Err(FactError::TooFewDependencies),
            [dep] => {
                let value = dep.result().ok_or(FactError::DependencyResultMissing)?;
                validate_value(task.fact(), value).map(Some)
            }
            _ if task.fact().rule == Some(Rule::DepsMatch) => deps_match(deps).map(Some),
            _ => Ok(None),
        }
    }
}

fn validate_value(fact: &Fact, value: &Value) -> Result<Value> {
    match value {
        Value::List(items) if fact.rule == Some(Rule::Unique) => Ok(Value::Bool(is_unique(items))),
        Value::List(items) => {
            let check = Check::compile(fact)?;
            items
                .iter()
                .map(|item| check.apply(item).map(Value::Bool))
                .collect::<Result<Vec<_>>>()
                .map(Value::List)
        }
        scalar => Check::compile(fact)?.apply(scalar).map(Value::Bool),
    }
}

fn is_unique(items: &[Value]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(i, item)| !items[..i].contains(item))
}

/// Cross-dependency comparison.
///
/// Mixed result kinds give `false`. For scalars every result is compared
/// with the first one for inequality, the first included, so any set of
/// scalar results gives `false`.
fn deps_match(deps: &[Arc<Task>]) -> Result<Value> {
    let kind = |task: &Arc<Task>| task.result().map_or("unset", Value::kind);
    let first = &deps[0];

    if deps.iter().any(|dep| kind(dep) != kind(first)) {
        return Ok(Value::Bool(false));
    }

    if first.result().is_some_and(Value::is_list) {
        return Err(FactError::NotImplemented {
            feature: "list comparison",
        });
    }

    let first_result = first.result();
    Ok(Value::Bool(
        deps.iter().all(|dep| dep.result() != first_result),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Source;
    use pretty_assertions::assert_eq;

    fn dep(id: &str, result: Option<Value>) -> Arc<Task> {
        Arc::new(Task::completed(Fact::extract(id, Source::JsonApi), result))
    }

    fn check(fact: Fact, deps: &[Arc<Task>]) -> Result<Option<Value>> {
        let task = Task::new(fact, Vec::new());
        Validator::new().check(&task, deps)
    }

    fn formula(pattern: &str) -> Fact {
        Fact::validate("v", Rule::Formula).with_pattern(pattern)
    }

    #[test]
    fn no_dependencies_is_an_error() {
        let err = check(formula("> 1"), &[]).unwrap_err();
        assert!(matches!(err, FactError::TooFewDependencies));
    }

    #[test]
    fn unset_dependency_is_an_error() {
        let err = check(formula("> 1"), &[dep("a", None)]).unwrap_err();
        assert_eq!(err.to_string(), "[FACT-021] dependency result not provided");
    }

    // ═══════════════════════════════════════════════════════════════
    // UNIQUE
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn unique_over_distinct_list() {
        let fact = Fact::validate("v", Rule::Unique);
        let result = check(fact, &[dep("a", Some(Value::from(vec![1, 2, 3])))]).unwrap();
        assert_eq!(result, Some(Value::Bool(true)));
    }

    #[test]
    fn unique_over_list_with_duplicate() {
        let fact = Fact::validate("v", Rule::Unique);
        let result = check(fact, &[dep("a", Some(Value::from(vec![1, 2, 2])))]).unwrap();
        assert_eq!(result, Some(Value::Bool(false)));
    }

    #[test]
    fn unique_on_scalar_is_unknown_rule() {
        let fact = Fact::validate("v", Rule::Unique);
        let err = check(fact, &[dep("a", Some(Value::from(1)))]).unwrap_err();
        assert!(matches!(err, FactError::UnknownRule { .. }));
    }

    // ═══════════════════════════════════════════════════════════════
    // FORMULA AND REGEX
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn formula_on_scalar() {
        let above = check(formula("> 10"), &[dep("a", Some(Value::from(12)))]).unwrap();
        let below = check(formula("> 10"), &[dep("a", Some(Value::from(5)))]).unwrap();
        assert_eq!(above, Some(Value::Bool(true)));
        assert_eq!(below, Some(Value::Bool(false)));
    }

    #[test]
    fn formula_without_operator_is_an_error() {
        let err = check(formula("10"), &[dep("a", Some(Value::from(12)))]).unwrap_err();
        assert!(matches!(err, FactError::Formula { .. }));
    }

    #[test]
    fn formula_on_numeric_text() {
        let result = check(formula(">= 2"), &[dep("a", Some(Value::from("2")))]).unwrap();
        assert_eq!(result, Some(Value::Bool(true)));
    }

    #[test]
    fn regex_on_list_gives_one_bool_per_element() {
        let fact = Fact::validate("v", Rule::RegexMatch).with_pattern(r"^\d+\.\d+$");
        let deps = [dep("a", Some(Value::from(vec!["1.2", "latest", "3.4"])))];
        let result = check(fact, &deps).unwrap();
        assert_eq!(result, Some(Value::from(vec![true, false, true])));
    }

    #[test]
    fn regex_matches_rendered_bool() {
        let fact = Fact::validate("v", Rule::RegexMatch).with_pattern("^true$");
        let result = check(fact, &[dep("a", Some(Value::Bool(true)))]).unwrap();
        assert_eq!(result, Some(Value::Bool(true)));
    }

    #[test]
    fn invalid_regex_is_an_error() {
        let fact = Fact::validate("v", Rule::RegexMatch).with_pattern("(");
        let err = check(fact, &[dep("a", Some(Value::from("x")))]).unwrap_err();
        assert!(matches!(err, FactError::InvalidPattern { .. }));
    }

    #[test]
    fn extraction_rule_on_validate_is_unknown() {
        let fact = Fact::validate("v", Rule::JsonPath);
        let err = check(fact, &[dep("a", Some(Value::from("x")))]).unwrap_err();
        assert!(matches!(err, FactError::UnknownRule { rule } if rule == "jsonpath"));
    }

    #[test]
    fn unrecognised_rule_is_unknown() {
        let fact: Fact =
            serde_yaml::from_str("id: v\ntype: validate\nrule: semver\npattern: x\n").unwrap();
        let err = check(fact, &[dep("a", Some(Value::from("1.2.3")))]).unwrap_err();
        assert!(matches!(err, FactError::UnknownRule { rule } if rule == "unknown"));
    }

    // ═══════════════════════════════════════════════════════════════
    // DEPS MATCH
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn deps_match_mixed_kinds_is_false() {
        let fact = Fact::validate("v", Rule::DepsMatch);
        let deps = [dep("a", Some(Value::from("1"))), dep("b", Some(Value::from(1)))];
        assert_eq!(check(fact, &deps).unwrap(), Some(Value::Bool(false)));
    }

    #[test]
    fn deps_match_on_lists_is_not_implemented() {
        let fact = Fact::validate("v", Rule::DepsMatch);
        let deps = [
            dep("a", Some(Value::from(vec![1]))),
            dep("b", Some(Value::from(vec![1]))),
        ];
        let err = check(fact, &deps).unwrap_err();
        assert!(matches!(err, FactError::NotImplemented { .. }));
    }

    #[test]
    fn deps_match_is_an_inequality_check() {
        // Each result is compared with the first for inequality, the first
        // included, so equal and differing scalars both give false
        let fact = Fact::validate("v", Rule::DepsMatch);
        let equal = [dep("a", Some(Value::from("x"))), dep("b", Some(Value::from("x")))];
        let differing = [dep("a", Some(Value::from("x"))), dep("b", Some(Value::from("y")))];

        assert_eq!(check(fact.clone(), &equal).unwrap(), Some(Value::Bool(false)));
        assert_eq!(check(fact, &differing).unwrap(), Some(Value::Bool(false)));
    }

    #[test]
    fn other_rules_with_several_dependencies_produce_nothing() {
        let deps = [dep("a", Some(Value::from(1))), dep("b", Some(Value::from(2)))];
        assert_eq!(check(formula("> 0"), &deps).unwrap(), None);
    }
}
