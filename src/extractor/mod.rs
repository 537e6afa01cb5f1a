//! Record extraction
//!
//! Evaluates the base selector against the document, then every field
//! selector against each base match only.

pub mod types;

use log::debug;
use serde_json::Value;

pub use types::{Field, Record, ResultSet};

use crate::dom::{DocumentHandle, ElementHandle};
use crate::error::{PickerError, Result};

/// Extract one record per base match
///
/// A field that matches nothing under a base match yields an empty string.
/// Any selector error aborts the whole extraction.
pub fn extract<D: DocumentHandle>(document: &D, base: &str, fields: &[Field]) -> Result<ResultSet> {
    let contexts = document.query_all(base)?;
    if contexts.is_empty() {
        return Err(PickerError::NoBaseMatch);
    }
    debug!("Base '{}' matched {} elements", base, contexts.len());

    let mut records = Vec::with_capacity(contexts.len());
    for context in &contexts {
        let mut record = Record::new();
        for field in fields {
            let value = context
                .query_first(&field.selector)?
                .map(|element| element.text().trim().to_string())
                .unwrap_or_default();
            record.insert(field.name.clone(), Value::String(value));
        }
        records.push(record);
    }

    Ok(ResultSet::new(records))
}
