//! Persisted form state

use log::debug;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::extractor::Field;

/// What the user typed or picked: the base selector and the field rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    #[serde(default)]
    pub base_selector: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl FormState {
    /// Trimmed base selector and the field rows that have both a name and a selector
    pub fn submission(&self) -> (String, Vec<Field>) {
        let fields = self
            .fields
            .iter()
            .filter(|field| field.is_complete())
            .map(|field| Field::new(field.name.trim(), field.selector.trim()))
            .collect();
        (self.base_selector.trim().to_string(), fields)
    }
}

/// JSON file holding the last [`FormState`]
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved state; a missing file is an empty form
    pub fn load(&self) -> Result<FormState> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(FormState::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, state: &FormState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(state)?)?;
        debug!("Saved form state to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
