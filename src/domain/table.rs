//! Column-oriented time series table.
//!
//! Rows are strictly increasing by timestamp. Every column is numeric; booleans
//! are promoted to `0.0`/`1.0` and missing values are stored as `NaN`.

use crate::domain::errors::DataAlignmentError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    values: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesTable {
    timestamps: Vec<i64>,
    columns: Vec<Column>,
}

impl TimeSeriesTable {
    /// Creates an empty table over the given timestamps (milliseconds).
    pub fn new(timestamps: Vec<i64>) -> Result<Self, DataAlignmentError> {
        if let Some(row) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(DataAlignmentError::UnorderedTimestamps { row: row + 1 });
        }
        Ok(Self {
            timestamps,
            columns: Vec::new(),
        })
    }

    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, DataAlignmentError> {
        self.push_column(name, values)?;
        Ok(self)
    }

    /// Appends a column. The table never replaces existing data.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), DataAlignmentError> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(DataAlignmentError::DuplicateColumn(name));
        }
        if values.len() != self.timestamps.len() {
            return Err(DataAlignmentError::ColumnLength {
                column: name,
                expected: self.timestamps.len(),
                actual: values.len(),
            });
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&[f64], DataAlignmentError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| DataAlignmentError::MissingColumn(name.to_string()))
    }

    /// Reads a column as booleans: any non-zero, non-missing value is true.
    pub fn bool_column(&self, name: &str) -> Result<Vec<bool>, DataAlignmentError> {
        Ok(self
            .column(name)?
            .iter()
            .map(|v| !v.is_nan() && *v != 0.0)
            .collect())
    }

    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<(), DataAlignmentError> {
        match names.iter().find(|n| !self.has_column(n.as_ref())) {
            Some(missing) => Err(DataAlignmentError::MissingColumn(
                missing.as_ref().to_string(),
            )),
            None => Ok(()),
        }
    }

    /// Copies the given rows of `columns` into row-major vectors.
    pub fn feature_rows<S: AsRef<str>>(
        &self,
        columns: &[S],
        rows: Range<usize>,
    ) -> Result<Vec<Vec<f64>>, DataAlignmentError> {
        let selected = columns
            .iter()
            .map(|name| self.column(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let rows = self.clamp(rows);

        Ok(rows
            .map(|row| selected.iter().map(|col| col[row]).collect())
            .collect())
    }

    /// Copies a row range, keeping only `columns` when given.
    pub fn slice_rows<S: AsRef<str>>(
        &self,
        rows: Range<usize>,
        columns: Option<&[S]>,
    ) -> Result<TimeSeriesTable, DataAlignmentError> {
        let rows = self.clamp(rows);
        let mut out = TimeSeriesTable {
            timestamps: self.timestamps[rows.clone()].to_vec(),
            columns: Vec::new(),
        };
        match columns {
            Some(names) => {
                for name in names {
                    let values = self.column(name.as_ref())?[rows.clone()].to_vec();
                    out.push_column(name.as_ref(), values)?;
                }
            }
            None => {
                for column in &self.columns {
                    out.columns.push(Column {
                        name: column.name.clone(),
                        values: column.values[rows.clone()].to_vec(),
                    });
                }
            }
        }
        Ok(out)
    }

    /// First row whose timestamp is at or after `timestamp`.
    pub fn find_index(&self, timestamp: i64) -> Option<usize> {
        let idx = self.timestamps.partition_point(|t| *t < timestamp);
        (idx < self.timestamps.len()).then_some(idx)
    }

    fn clamp(&self, rows: Range<usize>) -> Range<usize> {
        let end = rows.end.min(self.len());
        rows.start.min(end)..end
    }
}

/// Parses epoch milliseconds, RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` (UTC).
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(millis) = value.parse::<i64>() {
        return Some(millis);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("1580515200000"), Some(1_580_515_200_000));
        assert_eq!(parse_timestamp("2020-02-01 00:00:00"), Some(1_580_515_200_000));
        assert_eq!(parse_timestamp("2020-02-01T00:00:00Z"), Some(1_580_515_200_000));
        assert_eq!(parse_timestamp("2020-02-01"), Some(1_580_515_200_000));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    fn sample() -> TimeSeriesTable {
        TimeSeriesTable::new(vec![10, 20, 30, 40])
            .and_then(|t| t.with_column("close", vec![1.0, 2.0, 3.0, 4.0]))
            .and_then(|t| t.with_column("label", vec![0.0, 1.0, f64::NAN, 1.0]))
            .unwrap()
    }

    #[test]
    fn test_rejects_unordered_timestamps() {
        let err = TimeSeriesTable::new(vec![1, 2, 2, 3]).unwrap_err();
        assert!(matches!(err, DataAlignmentError::UnorderedTimestamps { row: 2 }));
    }

    #[test]
    fn test_missing_column() {
        let table = sample();
        let err = table.column("volume").unwrap_err();
        assert!(matches!(err, DataAlignmentError::MissingColumn(ref c) if c == "volume"));
        assert!(table.require_columns(&["close", "volume"]).is_err());
        assert!(table.require_columns(&["close", "label"]).is_ok());
    }

    #[test]
    fn test_push_column_checks_length_and_duplicates() {
        let mut table = sample();
        assert!(matches!(
            table.push_column("short", vec![1.0]),
            Err(DataAlignmentError::ColumnLength { .. })
        ));
        assert!(matches!(
            table.push_column("close", vec![0.0; 4]),
            Err(DataAlignmentError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_bool_column_treats_nan_as_false() {
        let table = sample();
        assert_eq!(
            table.bool_column("label").unwrap(),
            vec![false, true, false, true]
        );
    }

    #[test]
    fn test_slice_rows_and_feature_rows() {
        let table = sample();
        let sliced = table.slice_rows(1..3, Some(&["close"][..])).unwrap();
        assert_eq!(sliced.timestamps(), &[20, 30]);
        assert_eq!(sliced.column("close").unwrap(), &[2.0, 3.0]);
        assert!(!sliced.has_column("label"));

        let rows = table.feature_rows(&["close", "label"], 2..10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![4.0, 1.0]);
    }

    #[test]
    fn test_find_index() {
        let table = sample();
        assert_eq!(table.find_index(20), Some(1));
        assert_eq!(table.find_index(25), Some(2));
        assert_eq!(table.find_index(0), Some(0));
        assert_eq!(table.find_index(41), None);
    }
}
