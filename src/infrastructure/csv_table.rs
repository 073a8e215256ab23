//! CSV persistence for time series tables.

use crate::domain::errors::DataAlignmentError;
use crate::domain::table::{TimeSeriesTable, parse_timestamp};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Loads a table whose `timestamp` column holds epoch millis or datetimes.
///
/// Empty cells and `nan`/`null` become `NaN`; `true`/`false` become `1`/`0`.
pub fn read_table(path: impl AsRef<Path>) -> Result<TimeSeriesTable> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;

    let headers = rdr.headers()?.clone();
    let ts_idx = headers
        .iter()
        .position(|h| h == TIMESTAMP_COLUMN)
        .ok_or_else(|| DataAlignmentError::MissingColumn(TIMESTAMP_COLUMN.to_string()))?;

    let names: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != ts_idx)
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut timestamps = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

    for (row, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV row {}", row + 1))?;
        let raw_ts = record.get(ts_idx).unwrap_or_default();
        let ts = parse_timestamp(raw_ts).ok_or_else(|| DataAlignmentError::InvalidValue {
            column: TIMESTAMP_COLUMN.to_string(),
            row,
            value: raw_ts.to_string(),
        })?;
        timestamps.push(ts);

        for ((idx, name), values) in names.iter().zip(columns.iter_mut()) {
            let raw = record.get(*idx).unwrap_or_default();
            let value = parse_value(raw).ok_or_else(|| DataAlignmentError::InvalidValue {
                column: name.clone(),
                row,
                value: raw.to_string(),
            })?;
            values.push(value);
        }
    }

    let mut table = TimeSeriesTable::new(timestamps)?;
    for ((_, name), values) in names.into_iter().zip(columns) {
        table.push_column(name, values)?;
    }

    info!(
        "Loaded table from {}. Length: {}. Width: {}",
        path.display(),
        table.len(),
        table.column_names().count()
    );
    Ok(table)
}

/// Writes the table with the timestamp first; missing values are left empty.
pub fn write_table(table: &TimeSeriesTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    let names: Vec<&str> = table.column_names().collect();
    let columns = names
        .iter()
        .map(|n| table.column(n))
        .collect::<Result<Vec<_>, _>>()?;

    let mut header = vec![TIMESTAMP_COLUMN];
    header.extend(names.iter().copied());
    wtr.write_record(&header)?;

    for (row, ts) in table.timestamps().iter().enumerate() {
        let mut record = vec![ts.to_string()];
        record.extend(columns.iter().map(|c| format_value(c[row])));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    info!(
        "Stored table in {}. Length: {}. Columns: {}",
        path.display(),
        table.len(),
        names.len()
    );
    Ok(())
}

fn parse_value(raw: &str) -> Option<f64> {
    match raw.trim() {
        "" | "nan" | "NaN" | "NAN" | "null" | "None" => Some(f64::NAN),
        "true" | "True" | "TRUE" => Some(1.0),
        "false" | "False" | "FALSE" => Some(0.0),
        other => other.parse::<f64>().ok(),
    }
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_mixed_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,close,high_10").unwrap();
        writeln!(file, "2020-02-01 00:00:00,100.5,True").unwrap();
        writeln!(file, "2020-02-01 00:01:00,,False").unwrap();
        file.flush().unwrap();

        let table = read_table(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.timestamps()[1] - table.timestamps()[0], 60_000);
        assert_eq!(table.column("high_10").unwrap(), &[1.0, 0.0]);
        assert!(table.column("close").unwrap()[1].is_nan());
    }

    #[test]
    fn test_invalid_cell_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,close").unwrap();
        writeln!(file, "1,abc").unwrap();
        file.flush().unwrap();

        let err = read_table(file.path()).unwrap_err();
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_write_then_read_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("predictions.csv");
        let table = TimeSeriesTable::new(vec![1, 2])
            .and_then(|t| t.with_column("score", vec![0.25, f64::NAN]))
            .unwrap();

        write_table(&table, &path).unwrap();
        let loaded = read_table(&path).unwrap();

        assert_eq!(loaded.timestamps(), &[1, 2]);
        assert_eq!(loaded.column("score").unwrap()[0], 0.25);
        assert!(loaded.column("score").unwrap()[1].is_nan());
    }
}
