use crate::error::Result;
use crate::extractor::ResultSet;

/// Pretty-printed array of records, keys in field order
pub fn generate(results: &ResultSet) -> Result<String> {
    Ok(serde_json::to_string_pretty(results.records())?)
}
