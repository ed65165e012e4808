//! Component catalog files (the part the fact engine needs)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::fact::Fact;

/// A metric source: the facts whose final value becomes a tracked metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSource {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub metric: String,
    #[serde(default)]
    pub facts: Vec<Fact>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub component_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub type_id: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub tribe: String,
    #[serde(default)]
    pub squad: String,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
    /// metric name -> metric source (sorted for stable `--all` order)
    #[serde(default)]
    pub metric_sources: BTreeMap<String, MetricSource>,
}

/// Component file parsed from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: ComponentSpec,
}

impl Component {
    /// Look up a metric source by metric name
    pub fn metric_source(&self, metric: &str) -> Option<&MetricSource> {
        self.spec.metric_sources.get(metric)
    }
}
