//! Utilities Module - shared helpers for the fact engine
//!
//! - `constants`: Centralized timeouts and limits
//! - `jsonpath`: JSONPath subset returning every match
//! - `placeholder`: `:identifier` substitution for fetch targets
//! - `formula`: numeric comparison expressions for the `formula` rule
//! - `toml_json`: TOML to JSON conversion for source-control files

pub mod constants;
pub mod formula;
pub mod jsonpath;
pub mod placeholder;
pub mod toml_json;

pub use constants::{CONNECT_TIMEOUT, FETCH_TIMEOUT, REDIRECT_LIMIT, USER_AGENT};
