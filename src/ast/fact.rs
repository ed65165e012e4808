//! Fact definitions
//!
//! A fact is the declarative half of a task: what to extract, validate or
//! aggregate, and which other facts it depends on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The 3 task types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Extract,
    Validate,
    Aggregate,
    /// Any other type; the task is skipped at run time
    #[serde(other)]
    Unknown,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskType::Extract => "extract",
            TaskType::Validate => "validate",
            TaskType::Aggregate => "aggregate",
            TaskType::Unknown => "unknown",
        })
    }
}

/// Where an extract fact pulls its data from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    /// Source-control file content or code search
    #[serde(rename = "github", alias = "source-control")]
    SourceControl,
    /// Authenticated JSON HTTP API
    #[serde(rename = "jsonapi", alias = "json-api")]
    JsonApi,
    /// Instant time-series query
    #[serde(rename = "prometheus", alias = "time-series")]
    TimeSeries,
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::SourceControl => "github",
            Source::JsonApi => "jsonapi",
            Source::TimeSeries => "prometheus",
            Source::Unknown => "unknown",
        })
    }
}

/// Extraction and validation rules share one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    // Extraction rules
    #[serde(rename = "jsonpath")]
    JsonPath,
    #[serde(rename = "notempty")]
    NotEmpty,
    #[serde(rename = "search")]
    Search,

    // Validation rules
    #[serde(rename = "regex_match")]
    RegexMatch,
    #[serde(rename = "formula")]
    Formula,
    #[serde(rename = "unique")]
    Unique,
    #[serde(rename = "deps_match")]
    DepsMatch,

    /// Unrecognised rule: raw bytes for extract, an error for validate
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rule::JsonPath => "jsonpath",
            Rule::NotEmpty => "notempty",
            Rule::Search => "search",
            Rule::RegexMatch => "regex_match",
            Rule::Formula => "formula",
            Rule::Unique => "unique",
            Rule::DepsMatch => "deps_match",
            Rule::Unknown => "unknown",
        })
    }
}

/// Aggregate methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Count,
    Sum,
    And,
    Or,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Count => "count",
            Method::Sum => "sum",
            Method::And => "and",
            Method::Or => "or",
            Method::Unknown => "unknown",
        })
    }
}

/// Optional auth for JSON API facts: header name + env var holding the token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auth {
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub token_var: String,
}

/// A fact as authored in a metric source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    // Extract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uri: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub json_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prometheus_query: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repo: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub search_string: String,

    // Extract + validate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<Rule>,

    // Validate
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pattern: String,

    // Aggregate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
}

impl Fact {
    /// Bare fact of the given type; fill in the rest with the `with_*` helpers
    pub fn new(id: impl Into<String>, task_type: TaskType) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            task_type,
            depends_on: Vec::new(),
            source: None,
            uri: String::new(),
            json_path: String::new(),
            auth: None,
            prometheus_query: String::new(),
            repo: String::new(),
            file_path: String::new(),
            search_string: String::new(),
            rule: None,
            pattern: String::new(),
            method: None,
        }
    }

    pub fn extract(id: impl Into<String>, source: Source) -> Self {
        Self {
            source: Some(source),
            ..Self::new(id, TaskType::Extract)
        }
    }

    pub fn validate(id: impl Into<String>, rule: Rule) -> Self {
        Self {
            rule: Some(rule),
            ..Self::new(id, TaskType::Validate)
        }
    }

    pub fn aggregate(id: impl Into<String>, method: Method) -> Self {
        Self {
            method: Some(method),
            ..Self::new(id, TaskType::Aggregate)
        }
    }

    pub fn with_depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = repo.into();
        self
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = path.into();
        self
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search_string = query.into();
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn with_json_path(mut self, path: impl Into<String>) -> Self {
        self.json_path = path.into();
        self
    }

    pub fn with_auth(mut self, header: impl Into<String>, token_var: impl Into<String>) -> Self {
        self.auth = Some(Auth {
            header: header.into(),
            token_var: token_var.into(),
        });
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.prometheus_query = query.into();
        self
    }

    /// Apply `f` to every field that may carry a placeholder
    pub fn map_templates(&mut self, mut f: impl FnMut(&str) -> String) {
        for field in [
            &mut self.uri,
            &mut self.repo,
            &mut self.file_path,
            &mut self.search_string,
            &mut self.pattern,
            &mut self.prometheus_query,
        ] {
            if !field.is_empty() {
                *field = f(field);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extract_fact() {
        let yaml = r#"
id: read-deps
name: Read dependencies
type: extract
source: github
repo: my-service
filePath: package.json
rule: jsonpath
jsonPath: .dependencies | keys
"#;
        let fact: Fact = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fact.task_type, TaskType::Extract);
        assert_eq!(fact.source, Some(Source::SourceControl));
        assert_eq!(fact.rule, Some(Rule::JsonPath));
        assert_eq!(fact.file_path, "package.json");
        assert!(fact.depends_on.is_empty());
    }

    #[test]
    fn parse_source_aliases() {
        let fact: Fact =
            serde_yaml::from_str("id: q\ntype: extract\nsource: time-series\n").unwrap();
        assert_eq!(fact.source, Some(Source::TimeSeries));
    }

    #[test]
    fn parse_auth_and_depends_on() {
        let yaml = r#"
id: api
type: extract
source: jsonapi
uri: https://api.example.com/services/:name
auth:
  header: Authorization
  tokenVar: API_TOKEN
dependsOn: [names]
"#;
        let fact: Fact = serde_yaml::from_str(yaml).unwrap();
        let auth = fact.auth.unwrap();
        assert_eq!(auth.header, "Authorization");
        assert_eq!(auth.token_var, "API_TOKEN");
        assert_eq!(fact.depends_on, vec!["names".to_string()]);
    }

    #[test]
    fn unrecognised_names_parse_as_unknown() {
        let fact: Fact = serde_yaml::from_str("id: x\ntype: transform\n").unwrap();
        assert_eq!(fact.task_type, TaskType::Unknown);

        let fact: Fact =
            serde_yaml::from_str("id: avg\ntype: aggregate\nmethod: avg\n").unwrap();
        assert_eq!(fact.method, Some(Method::Unknown));

        let fact: Fact =
            serde_yaml::from_str("id: r\ntype: extract\nsource: gitlab\nrule: xpath\n").unwrap();
        assert_eq!(fact.source, Some(Source::Unknown));
        assert_eq!(fact.rule, Some(Rule::Unknown));
    }

    #[test]
    fn missing_task_type_fails_to_parse() {
        let result: Result<Fact, _> = serde_yaml::from_str("id: x\n");
        assert!(result.is_err());
    }

    #[test]
    fn map_templates_skips_empty_fields() {
        let mut fact = Fact::extract("f", Source::SourceControl)
            .with_repo("${Metadata.Name}")
            .with_file_path("README.md");
        let mut seen = Vec::new();
        fact.map_templates(|s| {
            seen.push(s.to_string());
            s.replace("${Metadata.Name}", "svc")
        });
        assert_eq!(fact.repo, "svc");
        assert_eq!(seen.len(), 2);
    }
}
