use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::error::PickerError;

/// A named column, selected relative to each base match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub selector: String,
}

impl Field {
    pub fn new(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
        }
    }

    /// Both name and selector are non-blank
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.selector.trim().is_empty()
    }
}

/// Parses `name=selector`
impl FromStr for Field {
    type Err = PickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, selector) = s.split_once('=').ok_or_else(|| {
            PickerError::MissingInput(format!("Field '{}' must be written as name=selector", s))
        })?;
        let field = Field::new(name.trim(), selector.trim());
        if !field.is_complete() {
            return Err(PickerError::MissingInput(format!(
                "Field '{}' needs both a name and a selector",
                s
            )));
        }
        Ok(field)
    }
}

/// Field name -> extracted text, in field order
pub type Record = serde_json::Map<String, Value>;

/// Records in document order of their base matches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    records: Vec<Record>,
}

impl ResultSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Cell text for `row`/`name`, empty when absent
    pub fn value(&self, row: usize, name: &str) -> &str {
        self.records
            .get(row)
            .and_then(|record| record.get(name))
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}
