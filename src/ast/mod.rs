//! AST Module - Rust types for YAML catalog files
//!
//! Contains parsed types from the declarative catalog:
//! - `fact`: Fact, TaskType, Source, Rule, Method, Auth
//! - `catalog`: Component, Metadata, ComponentSpec, MetricSource
//!
//! These types represent the "what" - static structure parsed from YAML.
//! For execution, see the `runtime` module.

mod catalog;
mod fact;

// Re-export all public types
pub use catalog::{Component, ComponentSpec, Metadata, MetricSource};
pub use fact::{Auth, Fact, Method, Rule, Source, TaskType};
