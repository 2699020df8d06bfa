//! CSV export of the filtered canonical table.
//!
//! The header row carries the canonical column names in Revenue-included
//! order; re-parsing the output and re-running numeric coercion reproduces
//! the same values (floating-point formatting aside).

use crate::error::Result;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Serialize a table to CSV bytes (UTF-8, header row included).
pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut df = df.clone();
    let mut buffer = Vec::new();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(&mut df)?;
    Ok(buffer)
}

/// Write a table to a CSV file on disk.
pub fn write_csv(df: &DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut df = df.clone();
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    info!("Exported {} rows to {}", df.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PRICE, REGION};

    #[test]
    fn test_to_csv_bytes_header_and_rows() {
        let df = DataFrame::new(vec![
            Column::from(Series::new(REGION.into(), &["East", "West"])),
            Column::from(Series::new(PRICE.into(), &[2.0, 3.5])),
        ])
        .unwrap();

        let bytes = to_csv_bytes(&df).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Region,Price"));
        assert_eq!(lines.next(), Some("East,2.0"));
        assert_eq!(lines.next(), Some("West,3.5"));
    }
}
