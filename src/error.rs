//! Error types with fix suggestions
//!
//! Error code ranges:
//! - FACT-000-019: Graph shape errors (raised before execution)
//! - FACT-020-039: Extract errors
//! - FACT-040-059: Validate errors
//! - FACT-060-069: Aggregate errors
//! - FACT-070-089: Source/transport errors
//! - FACT-090-099: Conversion, config and IO errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FactError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum FactError {
    // ═══════════════════════════════════════════
    // GRAPH ERRORS (000-019)
    // ═══════════════════════════════════════════
    #[error("[FACT-001] Duplicate task id '{task_id}'")]
    DuplicateTask { task_id: String },

    #[error("[FACT-002] Cycle detected in facts: {cycle}")]
    CycleDetected { cycle: String },

    #[error("[FACT-003] Expected a single sink task, found {count}: {sinks}")]
    AmbiguousSink { count: usize, sinks: String },

    // ═══════════════════════════════════════════
    // EXTRACT ERRORS (020-039)
    // ═══════════════════════════════════════════
    #[error("[FACT-020] Too many dependencies provided in extract context ({count})")]
    TooManyDependencies { count: usize },

    #[error("[FACT-021] dependency result not provided")]
    DependencyResultMissing,

    #[error("[FACT-022] Unsupported file extension: '{extension}'")]
    UnsupportedExtension { extension: String },

    #[error("[FACT-023] Task '{task_id}' is missing required field '{field}'")]
    MissingField { task_id: String, field: &'static str },

    #[error("[FACT-024] JSONPath '{path}' failed: {reason}")]
    JsonPath { path: String, reason: String },

    #[error("[FACT-025] Failed to convert TOML to JSON: {reason}")]
    TomlConversion { reason: String },

    #[error("[FACT-026] Invalid JSON data: {details}")]
    InvalidJson { details: String },

    // ═══════════════════════════════════════════
    // VALIDATE ERRORS (040-059)
    // ═══════════════════════════════════════════
    #[error("[FACT-040] Too few dependencies provided for validate task")]
    TooFewDependencies,

    #[error("[FACT-041] Unknown validation rule '{rule}'")]
    UnknownRule { rule: String },

    #[error("[FACT-042] Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("[FACT-043] Cannot evaluate '{expression}': {reason}")]
    Formula { expression: String, reason: String },

    #[error("[FACT-044] {feature} not implemented")]
    NotImplemented { feature: &'static str },

    // ═══════════════════════════════════════════
    // AGGREGATE ERRORS (060-069)
    // ═══════════════════════════════════════════
    #[error("[FACT-060] Unknown aggregate method '{method}'")]
    UnknownMethod { method: String },

    #[error("[FACT-061] Unsupported value for '{method}': {details}")]
    UnsupportedValue { method: &'static str, details: String },

    // ═══════════════════════════════════════════
    // SOURCE ERRORS (070-089)
    // ═══════════════════════════════════════════
    #[error("[FACT-070] 404 Not Found: {resource}")]
    NotFound { resource: String },

    #[error("[FACT-071] HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("[FACT-072] HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("[FACT-073] Fetch cancelled")]
    Cancelled,

    #[error("[FACT-074] Query failed: {reason}")]
    Query { reason: String },

    #[error("[FACT-075] Unknown source '{source_name}'")]
    UnknownSource { source_name: String },

    // ═══════════════════════════════════════════
    // CONVERSION / CONFIG / IO (090-099)
    // ═══════════════════════════════════════════
    #[error("[FACT-090] Cannot convert {value_type} to a number: {details}")]
    NotNumeric { value_type: &'static str, details: String },

    #[error("[FACT-091] Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("[FACT-092] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("[FACT-093] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[FACT-094] Unknown metric '{metric}' for component '{component}'")]
    UnknownMetric { metric: String, component: String },
}

impl FactError {
    /// Soft misses are "no data" rather than failures
    pub fn is_not_found(&self) -> bool {
        match self {
            FactError::NotFound { .. } => true,
            FactError::HttpStatus { status, .. } => *status == 404,
            _ => false,
        }
    }

    /// Errors raised while building the graph, before any task runs
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            FactError::DuplicateTask { .. }
                | FactError::CycleDetected { .. }
                | FactError::AmbiguousSink { .. }
        )
    }
}

impl FixSuggestion for FactError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            FactError::DuplicateTask { .. } => Some("Give every fact a unique id"),
            FactError::CycleDetected { .. } => {
                Some("Remove the circular dependsOn reference between facts")
            }
            FactError::AmbiguousSink { .. } => {
                Some("Add a final aggregate fact that depends on every branch")
            }
            FactError::TooManyDependencies { .. } => {
                Some("An extract fact may depend on at most one other extract fact")
            }
            FactError::DependencyResultMissing => {
                Some("Check the upstream fact: it failed or found no data")
            }
            FactError::UnsupportedExtension { .. } => {
                Some("The jsonpath rule on source-control files needs a .json or .toml file")
            }
            FactError::MissingField { .. } => Some("Add the missing field to the fact"),
            FactError::JsonPath { .. } => Some("Use paths like .a.b, .items[0], .items[].name, optionally piped into keys or length"),
            FactError::TomlConversion { .. } | FactError::InvalidJson { .. } => {
                Some("Check the fetched file is well-formed")
            }
            FactError::TooFewDependencies => Some("A validate fact needs a dependsOn entry"),
            FactError::UnknownRule { .. } => {
                Some("Use one of: regex_match, formula, unique, deps_match")
            }
            FactError::InvalidPattern { .. } => Some("Fix the regular expression in pattern"),
            FactError::Formula { .. } => {
                Some("Start the pattern with a comparison operator, e.g. '> 10'")
            }
            FactError::NotImplemented { .. } => None,
            FactError::UnknownMethod { .. } => Some("Use one of: count, sum, and, or"),
            FactError::UnsupportedValue { .. } => {
                Some("Check the dependency results match the aggregate method")
            }
            FactError::NotFound { .. } => Some("Check repo and file path"),
            FactError::Http(_) | FactError::HttpStatus { .. } => {
                Some("Check the URL is reachable and the token is valid")
            }
            FactError::Cancelled => None,
            FactError::Query { .. } => Some("Check the PromQL query and PROMETHEUS_URL"),
            FactError::UnknownSource { .. } => Some("Use one of: github, jsonapi, prometheus"),
            FactError::NotNumeric { .. } => {
                Some("The final fact must produce a number, boolean or numeric string")
            }
            FactError::Config { .. } => Some("Check config.toml and environment variables"),
            FactError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            FactError::Io(_) => Some("Check file path and permissions"),
            FactError::UnknownMetric { .. } => {
                Some("List the metricSources keys in the component file")
            }
        }
    }
}
