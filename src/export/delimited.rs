//! Comma-delimited exports: plain CSV and the spreadsheet flavour

use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::io;

use crate::error::{PickerError, Result};
use crate::extractor::{Field, ResultSet};

/// Byte-order mark so spreadsheet apps read the file as UTF-8
const BOM: char = '\u{feff}';

fn header(fields: &[Field]) -> Vec<&str> {
    fields.iter().map(|field| field.name.as_str()).collect()
}

fn rows<'a>(results: &'a ResultSet, fields: &[Field]) -> Vec<Vec<&'a str>> {
    (0..results.count())
        .map(|row| {
            fields
                .iter()
                .map(|field| results.value(row, &field.name))
                .collect()
        })
        .collect()
}

/// Every cell double-quoted with inner quotes doubled, lines joined by `\n`
fn quoted_lines(rows: &[Vec<&str>]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| PickerError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_suffix('\n').unwrap_or(&text).to_string())
}

/// Header row of bare field names, then one quoted line per record
pub fn generate_csv(results: &ResultSet, fields: &[Field]) -> Result<String> {
    let header = header(fields).join(",");
    let body = quoted_lines(&rows(results, fields))?;
    Ok(format!("{}\n{}", header, body))
}

/// BOM, then header and records all quoted
pub fn generate_excel(results: &ResultSet, fields: &[Field]) -> Result<String> {
    let mut lines = vec![header(fields)];
    lines.extend(rows(results, fields));
    Ok(format!("{}{}", BOM, quoted_lines(&lines)?))
}
