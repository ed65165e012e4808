//! DAG Module - fact dependency graph
//!
//! `FactGraph` indexes a metric source's facts, resolves `dependsOn`,
//! and rejects shapes that cannot be executed (duplicate ids, cycles,
//! more than one sink). It is immutable after construction.

mod graph;

pub use graph::{DepVec, FactGraph};
