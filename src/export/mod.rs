//! Export of extracted records
//!
//! Formats: `csv`, `json`, and `excel` (BOM-prefixed quoted CSV saved as `.xlsx`).

pub mod delimited;
pub mod json;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::PickerError;
use crate::extractor::{Field, ResultSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Excel,
}

impl ExportFormat {
    /// Default download name
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Csv => "scraped-data.csv",
            ExportFormat::Json => "scraped-data.json",
            ExportFormat::Excel => "scraped-data.xlsx",
        }
    }

    /// The payload is always text, whatever the extension says
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json; charset=utf-8",
            ExportFormat::Csv | ExportFormat::Excel => "text/plain; charset=utf-8",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Excel => write!(f, "excel"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = PickerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            other => Err(PickerError::UnknownFormat(other.to_string())),
        }
    }
}

/// Render `results` in `format`
pub fn render(
    format: ExportFormat,
    results: &ResultSet,
    fields: &[Field],
) -> crate::error::Result<String> {
    match format {
        ExportFormat::Csv => delimited::generate_csv(results, fields),
        ExportFormat::Json => json::generate(results),
        ExportFormat::Excel => delimited::generate_excel(results, fields),
    }
}

/// Render and save to `output`, or print to stdout
pub fn write_export(
    format: ExportFormat,
    results: &ResultSet,
    fields: &[Field],
    output: Option<&Path>,
) -> Result<()> {
    let content = render(format, results, fields)?;

    if let Some(path) = output {
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!(
            "{} {} export saved to: {}",
            "✓".green(),
            format,
            path.display()
        );
    } else {
        println!("{}", content);
    }

    Ok(())
}
