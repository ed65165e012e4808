//! TOML to JSON conversion so `.toml` files can be queried with JSONPath

use crate::error::{FactError, Result};

/// Parse a TOML document and serialize it as JSON bytes
pub fn toml_to_json(content: &str) -> Result<Vec<u8>> {
    let table: toml::Table = toml::from_str(content).map_err(|e| FactError::TomlConversion {
        reason: e.to_string(),
    })?;
    serde_json::to_vec(&table).map_err(|e| FactError::TomlConversion {
        reason: e.to_string(),
    })
}
