//! Runtime Module - fact graph execution
//!
//! Contains the runtime execution components:
//! - `task`: runtime node (fact + result + completion signal)
//! - `processor`: concurrent graph execution with tokio
//! - `extractor`: fetch and shape data for extract facts
//! - `validator`: boolean rules for validate facts
//! - `aggregator`: count/sum/and/or for aggregate facts
//!
//! This module represents the "how" - runtime execution.
//! For static structure, see the `ast` module.

mod aggregator;
mod extractor;
mod processor;
mod task;
mod validator;

// Re-export public types
pub use aggregator::{combine_value, Aggregator};
pub use extractor::Extractor;
pub use processor::{FactOutcome, Processor, Run};
pub use task::Task;
pub use validator::Validator;
