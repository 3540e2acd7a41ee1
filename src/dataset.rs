//! Row-major CSV records to column-major raw values.
//!
//! The reader hands over every record verbatim. This module checks that the
//! table is rectangular, drops blank rows and repeated header rows, decides
//! whether the first record is a header, and transposes the data into one
//! `Vec<String>` per column.

use std::collections::HashSet;

use log::debug;

use crate::{
    config::InferenceConfig,
    data::{is_missing, parse_datetime, parse_numeric},
    error::{Error, Result},
    schema::resolve_column_names,
};

/// Rows after the first that header detection looks at.
const HEADER_DETECTION_SAMPLE_ROWS: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderMode {
    #[default]
    Auto,
    Present,
    Absent,
}

impl HeaderMode {
    pub fn from_flags(header: bool, no_header: bool) -> Self {
        match (header, no_header) {
            (true, _) => HeaderMode::Present,
            (_, true) => HeaderMode::Absent,
            _ => HeaderMode::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub names: Vec<String>,
    pub has_header: bool,
    pub columns: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Builds a table from raw records. Records are numbered from 1 in error
    /// messages, matching line numbers for single-line CSV records.
    ///
    /// Rows whose every cell is missing are dropped, as are later rows that
    /// repeat the header verbatim.
    pub fn from_records(
        records: Vec<Vec<String>>,
        mode: HeaderMode,
        config: &InferenceConfig,
    ) -> Result<Self> {
        let Some(width) = records.first().map(Vec::len) else {
            return Err(Error::malformed("input", "no records to profile"));
        };
        if width == 0 {
            return Err(Error::malformed("row 1", "record has no fields"));
        }
        for (idx, record) in records.iter().enumerate() {
            if record.len() != width {
                return Err(Error::malformed(
                    format!("row {}", idx + 1),
                    format!("has {} field(s), expected {width}", record.len()),
                ));
            }
        }

        let total = records.len();
        let records = records
            .into_iter()
            .filter(|record| !record.iter().all(|value| is_missing(value, config)))
            .collect::<Vec<_>>();
        if records.len() < total {
            debug!("Dropped {} blank row(s)", total - records.len());
        }
        let Some(first) = records.first() else {
            return Err(Error::malformed("input", "every row is blank"));
        };

        let has_header = match mode {
            HeaderMode::Present => true,
            HeaderMode::Absent => false,
            HeaderMode::Auto => {
                let repeated = records[1..].iter().any(|record| same_row(record, first));
                let sample = records[1..]
                    .iter()
                    .filter(|record| !same_row(record, first))
                    .take(HEADER_DETECTION_SAMPLE_ROWS)
                    .cloned()
                    .collect::<Vec<_>>();
                if repeated {
                    // A repeat of the first row is either a repeated header or a
                    // duplicate record; only typed evidence tells them apart.
                    let (header_signal, data_signal) = signal_counts(first, &sample);
                    mostly_labels(first) && header_signal > data_signal
                } else {
                    looks_like_header(first, &sample)
                }
            }
        };

        let mut rows = records.into_iter();
        let header = if has_header { rows.next() } else { None };
        let mut columns = vec![Vec::new(); width];
        let mut repeated_headers = 0usize;
        for row in rows {
            if header.as_deref().is_some_and(|names| same_row(&row, names)) {
                repeated_headers += 1;
                continue;
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
        if repeated_headers > 0 {
            debug!("Dropped {repeated_headers} repeated header row(s)");
        }
        let names = resolve_column_names(header.as_deref(), width);

        Ok(RawTable {
            names,
            has_header,
            columns,
        })
    }
}

fn same_row(row: &[String], other: &[String]) -> bool {
    row.len() == other.len() && row.iter().zip(other).all(|(a, b)| a.trim() == b.trim())
}

fn value_is_data_like(value: &str) -> bool {
    let trimmed = value.trim();
    parse_numeric(trimmed).is_some() || parse_datetime(trimmed).is_some()
}

fn value_is_label_like(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty()
        && !value_is_data_like(trimmed)
        && trimmed.chars().any(|c| c.is_alphabetic())
}

/// At least half of the first-row cells must read as labels.
fn mostly_labels(first: &[String]) -> bool {
    let labels = first
        .iter()
        .filter(|value| value_is_label_like(value))
        .count();
    labels * 2 > first.len() || labels == first.len()
}

/// Header and data signals of `first` against the rows that follow it.
fn signal_counts(first: &[String], others: &[Vec<String>]) -> (usize, usize) {
    let mut header_signal = 0usize;
    let mut data_signal = 0usize;
    for (column, first_value) in first.iter().enumerate() {
        let trimmed = first_value.trim();
        let column_values = others
            .iter()
            .filter_map(|row| row.get(column))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>();
        if column_values.contains(&trimmed) {
            // The first-row value recurs as data in its own column.
            data_signal += 1;
            continue;
        }
        let data_below = column_values.iter().any(|value| value_is_data_like(value));
        if value_is_label_like(trimmed) && data_below {
            header_signal += 1;
        } else if value_is_data_like(trimmed) && data_below {
            data_signal += 1;
        }
    }
    (header_signal, data_signal)
}

/// Decides whether `first` is a header row given a sample of the rows that
/// follow it.
pub fn looks_like_header(first: &[String], others: &[Vec<String>]) -> bool {
    if !mostly_labels(first) {
        return false;
    }
    if others.is_empty() {
        return true;
    }

    let (header_signal, data_signal) = signal_counts(first, others);
    if header_signal != data_signal {
        return header_signal > data_signal;
    }
    // No typed evidence either way: an all-label row with unique, distinct
    // cells is taken as a header.
    let distinct = first
        .iter()
        .map(|value| value.trim())
        .collect::<HashSet<_>>()
        .len();
    data_signal == 0 && distinct == first.len()
}
