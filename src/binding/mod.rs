//! Binding Module - component values in metric facts
//!
//! Metric facts are authored once and bound to each component. Fields that
//! may carry templates (`uri`, `repo`, `filePath`, `searchString`, `pattern`,
//! `prometheusQuery`) use `${Path.To.Field}`:
//!
//! ```yaml
//! repo: ${Metadata.Name}
//! uri: https://status.example.com/services/${Spec.Slug}
//! ```
//!
//! Paths are dot-separated and matched case-insensitively against the
//! component as written in YAML. An unknown path resolves to an empty string.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value as Json;

use crate::ast::{Component, Fact};
use crate::error::{FactError, Result};

/// Pre-compiled regex for `${Path.To.Field}`
static COMPONENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{(.*?)\}").unwrap());

/// A component flattened to JSON for path lookups
#[derive(Debug, Clone)]
pub struct ComponentBinding {
    document: Json,
}

impl ComponentBinding {
    pub fn new(component: &Component) -> Result<Self> {
        let document = serde_json::to_value(component).map_err(|e| FactError::InvalidJson {
            details: e.to_string(),
        })?;
        Ok(Self { document })
    }

    /// Resolve every `${...}` in `template`
    ///
    /// Returns `Cow::Borrowed` when there is nothing to resolve.
    pub fn resolve<'a>(&self, template: &'a str) -> Cow<'a, str> {
        if !template.contains("${") {
            return Cow::Borrowed(template);
        }
        COMPONENT_RE.replace_all(template, |caps: &Captures<'_>| {
            lookup(&self.document, &caps[1])
                .map(render)
                .unwrap_or_default()
        })
    }

    /// Copies of `facts` with every template field resolved
    pub fn bind_facts(&self, facts: &[Fact]) -> Vec<Fact> {
        facts
            .iter()
            .map(|fact| {
                let mut fact = fact.clone();
                fact.map_templates(|field| self.resolve(field).into_owned());
                fact
            })
            .collect()
    }
}

/// Walk a dot path, matching object keys case-insensitively
fn lookup<'a>(document: &'a Json, path: &str) -> Option<&'a Json> {
    path.trim()
        .split('.')
        .try_fold(document, |current, segment| match current {
            Json::Object(map) => map
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(segment))
                .map(|(_, value)| value),
            _ => None,
        })
}

fn render(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        Json::Null => String::new(),
        other => other.to_string(),
    }
}
