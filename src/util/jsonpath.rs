//! JSONPath Parser - jq-style query subset returning every match
//!
//! Supports:
//! - $.a.b.c and .a.b.c (dot notation, `$` or jq-style leading dot)
//! - a.b.c (no prefix, first stage only)
//! - $.a[0].b and a.0.b (array index)
//! - $.a[*], .a[], .a.* (wildcard over array elements or object values)
//! - $["key with spaces"] (quoted field)
//! - `.` or `$` (whole document)
//! - Pipes into `keys` and `length`: `.dependencies | keys`
//!
//! Does NOT support:
//! - Filters: $.a[?(@.x==1)]
//! - Slices: $.a[0:5]
//! - Recursive descent: $..a
//! - Other function calls or operators
//!
//! Unsupported syntax is an error, never an empty match. Missing fields,
//! out-of-range indexes and lookups on null yield `null`, as in jq.

use std::iter::Peekable;
use std::str::Chars;

use serde_json::Value;

use crate::error::{FactError, Result};

/// A parsed JSONPath segment
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Object field access: .field
    Field(String),
    /// Array index access: [0]
    Index(usize),
    /// Every array element or object value: [*]
    Wildcard,
}

/// One stage of a piped query
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Path(Vec<Segment>),
    /// Object keys (sorted) or array indexes
    Keys,
    /// Element count, string length or absolute number
    Length,
}

/// Parse a query into pipe stages
///
/// Examples:
/// - "$.price.currency" → [Path([Field("price"), Field("currency")])]
/// - ".dependencies | keys" → [Path([Field("dependencies")]), Keys]
pub fn parse(query: &str) -> Result<Vec<Stage>> {
    let invalid = |reason: String| FactError::JsonPath {
        path: query.to_string(),
        reason,
    };

    split_pipes(query)
        .map_err(invalid)?
        .into_iter()
        .enumerate()
        .map(|(i, stage)| match stage.trim() {
            "" => Err(invalid("empty pipe stage".to_string())),
            "keys" => Ok(Stage::Keys),
            "length" => Ok(Stage::Length),
            path => parse_path(path, i == 0).map(Stage::Path).map_err(invalid),
        })
        .collect()
}

/// Split on `|` outside brackets and quotes
fn split_pipes(query: &str) -> std::result::Result<Vec<&str>, String> {
    let mut stages = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in query.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, '|') if depth == 0 => {
                stages.push(&query[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return Err("unclosed quote".to_string());
    }
    stages.push(&query[start..]);
    Ok(stages)
}

/// Parse one path stage into segments
fn parse_path(path: &str, allow_bare: bool) -> std::result::Result<Vec<Segment>, String> {
    let body = path.strip_prefix('$').unwrap_or(path);
    let mut chars = body.chars().peekable();
    let mut segments = Vec::new();
    let mut first = true;

    while let Some(&c) = chars.peek() {
        match c {
            '.' => {
                chars.next();
                match chars.peek() {
                    // Trailing or lone dot: current value
                    None => break,
                    Some('[') => {}
                    Some('.') => return Err("recursive descent is not supported".to_string()),
                    Some(&c) if is_name_char(c) => {
                        segments.push(name_segment(&take_name(&mut chars)))
                    }
                    Some(&other) => return Err(unexpected(other)),
                }
            }
            '[' => {
                chars.next();
                segments.push(bracket_segment(&mut chars)?);
            }
            c if first && is_name_char(c) => {
                let name = take_name(&mut chars);
                match chars.peek() {
                    Some('(') => return Err(unexpected('(')),
                    _ if allow_bare => segments.push(name_segment(&name)),
                    _ => return Err(format!("unsupported function '{}'", name)),
                }
            }
            other => return Err(unexpected(other)),
        }
        first = false;
    }

    Ok(segments)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '*'
}

fn unexpected(c: char) -> String {
    match c {
        '(' | ')' => "function calls are not supported".to_string(),
        c if c.is_whitespace() => "unexpected whitespace".to_string(),
        c => format!("unexpected character '{}'", c),
    }
}

fn take_name(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if !is_name_char(c) {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

fn name_segment(name: &str) -> Segment {
    if name == "*" {
        Segment::Wildcard
    } else if let Ok(index) = name.parse::<usize>() {
        // Numeric segment treated as array index (e.g., "items.0")
        Segment::Index(index)
    } else {
        Segment::Field(name.to_string())
    }
}

fn bracket_segment(chars: &mut Peekable<Chars<'_>>) -> std::result::Result<Segment, String> {
    let mut inner = String::new();
    loop {
        match chars.next() {
            Some(']') => break,
            Some(c) => inner.push(c),
            None => return Err("unclosed '['".to_string()),
        }
    }

    let inner = inner.trim();
    if inner.is_empty() || inner == "*" {
        return Ok(Segment::Wildcard);
    }
    if let Some(quoted) = inner
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| inner.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
    {
        return Ok(Segment::Field(quoted.to_string()));
    }
    inner
        .parse::<usize>()
        .map(Segment::Index)
        .map_err(|_| format!("unsupported index '{}'", inner))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn step(segment: &Segment, value: Value, out: &mut Vec<Value>) -> std::result::Result<(), String> {
    match (segment, value) {
        (Segment::Field(name), Value::Object(mut map)) => {
            out.push(map.remove(name).unwrap_or(Value::Null))
        }
        (Segment::Index(idx), Value::Array(mut items)) => {
            out.push(if *idx < items.len() {
                items.swap_remove(*idx)
            } else {
                Value::Null
            })
        }
        (Segment::Field(_) | Segment::Index(_), Value::Null) => out.push(Value::Null),
        (Segment::Wildcard, Value::Array(items)) => out.extend(items),
        (Segment::Wildcard, Value::Object(map)) => out.extend(map.into_iter().map(|(_, v)| v)),
        (Segment::Field(name), other) => {
            return Err(format!("cannot index {} with \"{}\"", type_name(&other), name))
        }
        (Segment::Index(idx), other) => {
            return Err(format!("cannot index {} with {}", type_name(&other), idx))
        }
        (Segment::Wildcard, other) => {
            return Err(format!("cannot iterate over {}", type_name(&other)))
        }
    }
    Ok(())
}

fn keys(value: Value) -> std::result::Result<Value, String> {
    match value {
        Value::Object(map) => {
            let mut names: Vec<String> = map.into_iter().map(|(k, _)| k).collect();
            names.sort();
            Ok(Value::Array(names.into_iter().map(Value::String).collect()))
        }
        Value::Array(items) => Ok(Value::Array((0..items.len()).map(Value::from).collect())),
        other => Err(format!("{} has no keys", type_name(&other))),
    }
}

fn length(value: Value) -> std::result::Result<Value, String> {
    match value {
        Value::Null => Ok(Value::from(0)),
        Value::Array(items) => Ok(Value::from(items.len())),
        Value::Object(map) => Ok(Value::from(map.len())),
        Value::String(s) => Ok(Value::from(s.chars().count())),
        Value::Number(n) => Ok(match n.as_i64() {
            Some(i) => Value::from(i.unsigned_abs()),
            None => n
                .as_f64()
                .and_then(|f| serde_json::Number::from_f64(f.abs()))
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }),
        other => Err(format!("{} has no length", type_name(&other))),
    }
}

/// Apply parsed stages to a JSON value, collecting every match
pub fn apply(value: Value, stages: &[Stage]) -> std::result::Result<Vec<Value>, String> {
    let mut current = vec![value];

    for stage in stages {
        current = match stage {
            Stage::Path(segments) => {
                for segment in segments {
                    let mut next = Vec::new();
                    for value in current {
                        step(segment, value, &mut next)?;
                    }
                    current = next;
                }
                current
            }
            Stage::Keys => current.into_iter().map(keys).collect::<std::result::Result<_, _>>()?,
            Stage::Length => current
                .into_iter()
                .map(length)
                .collect::<std::result::Result<_, _>>()?,
        };
    }

    Ok(current)
}

/// Parse JSON bytes and return every match of `path`
pub fn query(path: &str, data: &[u8]) -> Result<Vec<Value>> {
    let stages = parse(path)?;
    let document: Value = serde_json::from_slice(data).map_err(|e| FactError::InvalidJson {
        details: e.to_string(),
    })?;
    apply(document, &stages).map_err(|reason| FactError::JsonPath {
        path: path.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(query: &str) -> Vec<Segment> {
        match parse(query).unwrap().as_slice() {
            [Stage::Path(segments)] => segments.clone(),
            other => panic!("expected a single path stage, got {:?}", other),
        }
    }

    #[test]
    fn parse_simple_path() {
        assert_eq!(
            path("$.a.b.c"),
            vec![
                Segment::Field("a".to_string()),
                Segment::Field("b".to_string()),
                Segment::Field("c".to_string()),
            ]
        );
    }

    #[test]
    fn parse_jq_style_and_bare() {
        assert_eq!(path(".a.b"), path("a.b"));
        assert_eq!(path(".a.b"), path("$.a.b"));
    }

    #[test]
    fn parse_with_array_index_and_wildcards() {
        assert_eq!(
            path("$.items[0].name"),
            vec![
                Segment::Field("items".to_string()),
                Segment::Index(0),
                Segment::Field("name".to_string()),
            ]
        );
        assert_eq!(path(".items[].name"), path("$.items[*].name"));
        assert_eq!(
            path("$.deps.*"),
            vec![Segment::Field("deps".to_string()), Segment::Wildcard]
        );
    }

    #[test]
    fn parse_root_forms() {
        assert!(path("$").is_empty());
        assert!(path(".").is_empty());
        assert_eq!(path(".[]"), vec![Segment::Wildcard]);
    }

    #[test]
    fn parse_quoted_field() {
        assert_eq!(
            path(r#"$["my key"].x"#),
            vec![
                Segment::Field("my key".to_string()),
                Segment::Field("x".to_string())
            ]
        );
        // A pipe inside quotes is part of the key
        assert_eq!(path(r#".["a|b"]"#), vec![Segment::Field("a|b".to_string())]);
    }

    #[test]
    fn parse_pipe_into_builtins() {
        assert_eq!(
            parse(".dependencies | keys").unwrap(),
            vec![
                Stage::Path(vec![Segment::Field("dependencies".to_string())]),
                Stage::Keys
            ]
        );
        assert_eq!(parse(".items|length").unwrap().last(), Some(&Stage::Length));
    }

    #[test]
    fn parse_rejects_unsupported() {
        assert!(parse("$..a").is_err());
        assert!(parse("$.a[?(@.x==1)]").is_err());
        assert!(parse("$.a[0").is_err());
        assert!(parse(".a b").is_err());
        assert!(parse(".a | select(.x)").is_err());
        assert!(parse(".a | map(.b)").is_err());
        assert!(parse(".a |").is_err());
        assert!(parse(".a | .b + 1").is_err());
        // Bare paths only start a query
        assert!(parse(".a | b").is_err());
        assert!(parse("length(.a)").is_err());
    }

    #[test]
    fn parse_error_names_the_problem() {
        match parse(".a | length(.b)") {
            Err(FactError::JsonPath { reason, .. }) => {
                assert_eq!(reason, "function calls are not supported")
            }
            other => panic!("expected jsonpath error, got {:?}", other),
        }
    }

    #[test]
    fn apply_wildcard_collects_all() {
        let value = json!({"users": [{"name": "Alice"}, {"name": "Bob"}, {"id": 3}]});
        let matches = apply(value, &parse("$.users[*].name").unwrap()).unwrap();
        assert_eq!(matches, vec![json!("Alice"), json!("Bob"), json!(null)]);
    }

    #[test]
    fn apply_missing_field_is_null() {
        let matches = apply(json!({"a": 1}), &parse("$.b").unwrap()).unwrap();
        assert_eq!(matches, vec![json!(null)]);
        let matches = apply(json!({"a": [1]}), &parse(".a[3]").unwrap()).unwrap();
        assert_eq!(matches, vec![json!(null)]);
        let matches = apply(json!({}), &parse(".a.b.c").unwrap()).unwrap();
        assert_eq!(matches, vec![json!(null)]);
    }

    #[test]
    fn apply_type_mismatch_is_error() {
        assert!(apply(json!({"a": 1}), &parse(".a.b").unwrap()).is_err());
        assert!(apply(json!({"a": "x"}), &parse(".a[]").unwrap()).is_err());
        assert!(apply(json!({}), &parse(".a[]").unwrap()).is_err());
    }

    #[test]
    fn apply_object_wildcard() {
        let value = json!({"dependencies": {"serde": "1.0", "tokio": "1.40"}});
        let matches = apply(value, &parse(".dependencies.*").unwrap()).unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn apply_keys_and_length() {
        let value = json!({"dependencies": {"tokio": "1.40", "serde": "1.0"}});
        let matches = apply(value.clone(), &parse(".dependencies | keys").unwrap()).unwrap();
        assert_eq!(matches, vec![json!(["serde", "tokio"])]);

        let matches = apply(value, &parse(".dependencies | length").unwrap()).unwrap();
        assert_eq!(matches, vec![json!(2)]);

        let matches = apply(json!({"a": [1, 2, 3]}), &parse(".a[] | length").unwrap()).unwrap();
        assert_eq!(matches, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn query_parses_bytes() {
        let matches = query(".version", br#"{"version": "2.1.0"}"#).unwrap();
        assert_eq!(matches, vec![json!("2.1.0")]);
        assert!(query(".version", b"not json").is_err());
        assert!(query(".version.major", br#"{"version": "2.1.0"}"#).is_err());
    }
}
