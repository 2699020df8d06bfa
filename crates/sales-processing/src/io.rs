//! CSV loading with fallback strategies.
//!
//! Real-world uploads are messy: stray quoting, doubled quote characters,
//! blank lines. Loading tries a standard read first, then progressively more
//! forgiving strategies, and surfaces a single structural error only when
//! every strategy fails.

use crate::error::{Result, SalesError};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Read a CSV file from disk.
pub fn read_csv_path(path: impl AsRef<Path>) -> Result<DataFrame> {
    let bytes = std::fs::read(path.as_ref())?;
    read_csv_bytes(&bytes)
}

/// Read a CSV table from raw bytes.
pub fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    // Strategy 1: standard read with quote handling
    match read_with_options(bytes.to_vec(), true) {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard CSV read failed: {e}"),
    }

    // Strategy 2: without quote handling
    match read_with_options(bytes.to_vec(), false) {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Quote-less CSV read failed: {e}"),
    }

    // Strategy 3: pre-clean the content
    let text = String::from_utf8_lossy(bytes);
    let cleaned = clean_csv_content(&text);
    read_with_options(cleaned.into_bytes(), true)
        .map_err(|e| SalesError::CsvParse(e.to_string()))
}

fn read_with_options(bytes: Vec<u8>, quoted: bool) -> PolarsResult<DataFrame> {
    let mut options = CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true);
    if quoted {
        options =
            options.with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')));
    }
    options
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
