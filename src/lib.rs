//! Factgraph - fact computation engine for catalog metrics
//!
//! A metric source is a small graph of facts. Extract facts read files,
//! JSON APIs or time series; validate facts turn values into booleans;
//! aggregate facts reduce their dependencies. The single sink's value is
//! the metric.
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  ast/       YAML → Rust types (Component, MetricSource, Fact)│
//! │  value      Dynamic task results (Value)                     │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  runtime/   Graph execution (Processor, Extractor, ...)      │
//! │  dag/       Fact graph (FactGraph: cycles, sink, order)      │
//! │  binding/   Component values in fact templates               │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  source/    GitHub, JSON API and Prometheus clients + mocks  │
//! │  util/      jsonpath, placeholders, formulas, toml → json    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`ast`] | Catalog YAML → `Component`, `MetricSource`, `Fact` |
//! | [`runtime`] | Concurrent graph execution with tokio |
//! | [`dag`] | Dependency graph with FxHashMap adjacency |
//! | [`binding`] | `${Path}` component placeholders |
//! | [`source`] | External data sources behind traits |
//! | [`util`] | Small parsers shared by the handlers |
//! | [`config`] | Env > TOML file > defaults |
//! | [`error`] | Error types with fix suggestions |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL - YAML → Rust types
// ═══════════════════════════════════════════════════════════════
pub mod ast;
pub mod value;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - Execution logic
// ═══════════════════════════════════════════════════════════════
pub mod binding;
pub mod dag;
pub mod runtime;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER - Sources, helpers
// ═══════════════════════════════════════════════════════════════
pub mod source;
pub mod util;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

// Error types
pub use error::{FactError, FixSuggestion, Result};

// Config types
pub use config::{mask_secret, FactConfig, TokenSource};

// AST types
pub use ast::{Auth, Component, Fact, Method, MetricSource, Rule, Source, TaskType};

// Runtime types
pub use runtime::{Aggregator, Extractor, FactOutcome, Processor, Run, Task, Validator};

// Graph and binding
pub use binding::ComponentBinding;
pub use dag::FactGraph;

// Sources
pub use source::{JsonApi, SourceControl, Sources, TimeSeries};

pub use value::Value;
