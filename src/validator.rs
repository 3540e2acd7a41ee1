//! Structural and statistical checks for schemas.
//!
//! Every check runs independently and appends to one [`ValidationReport`],
//! so a single call surfaces every defect. Checks come in two layers:
//! [`validate_document`] inspects raw JSON (missing fields, unknown types,
//! statistics keyed under the wrong type) and then hands each well-formed
//! column to the same typed checks [`validate`] runs on a [`Schema`].

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    data::is_renderable_pattern,
    schema::{ColumnProfile, ColumnStatistics, InferredType, Schema},
};

/// Allowed drift of a frequency table's total away from 1.
pub const FREQUENCY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Column the defect belongs to, when it belongs to one.
    pub column: Option<String>,
    pub message: String,
}

impl Violation {
    fn schema(message: impl Into<String>) -> Self {
        Self {
            column: None,
            message: message.into(),
        }
    }

    fn column(column: &str, message: impl Into<String>) -> Self {
        Self {
            column: Some(column.to_string()),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(f, "column '{column}': {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }
}

/// Validates a typed schema.
pub fn validate(schema: &Schema) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_names(
        schema.columns.iter().map(|column| Some(column.name.as_str())),
        &mut report,
    );
    for column in &schema.columns {
        check_profile(column, &mut report);
    }
    report
}

/// Validates a raw interchange document.
pub fn validate_document(document: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();
    let Some(root) = document.as_object() else {
        report.push(Violation::schema("schema document must be a JSON object"));
        return report;
    };

    match root.get("row_count") {
        None => report.push(Violation::schema("missing required field `row_count`")),
        Some(value) if value.as_u64().is_none() => report.push(Violation::schema(
            "`row_count` must be a non-negative integer",
        )),
        Some(_) => {}
    }
    match root.get("source_had_header") {
        None => report.push(Violation::schema(
            "missing required field `source_had_header`",
        )),
        Some(value) if !value.is_boolean() => {
            report.push(Violation::schema("`source_had_header` must be a boolean"))
        }
        Some(_) => {}
    }

    let columns = match root.get("columns") {
        None => {
            report.push(Violation::schema("missing required field `columns`"));
            return report;
        }
        Some(Value::Array(columns)) => columns,
        Some(_) => {
            report.push(Violation::schema("`columns` must be an array"));
            return report;
        }
    };

    check_names(
        columns
            .iter()
            .map(|column| column.get("name").and_then(Value::as_str)),
        &mut report,
    );

    for (index, column) in columns.iter().enumerate() {
        let label = column_label(index, column);
        let Some(fields) = column.as_object() else {
            report.push(Violation::column(&label, "column entry must be a JSON object"));
            continue;
        };
        if !check_column_fields(&label, fields, &mut report) {
            continue;
        }
        match serde_json::from_value::<ColumnProfile>(column.clone()) {
            Ok(profile) => check_profile(&profile, &mut report),
            Err(err) => report.push(Violation::column(
                &label,
                format!("malformed statistics: {err}"),
            )),
        }
    }
    report
}

fn column_label(index: usize, column: &Value) -> String {
    column
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{index}"))
}

fn check_names<'a>(names: impl Iterator<Item = Option<&'a str>>, report: &mut ValidationReport) {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    let mut count = 0usize;
    for (index, name) in names.enumerate() {
        count += 1;
        let Some(name) = name else {
            continue;
        };
        if name.trim().is_empty() {
            report.push(Violation::schema(format!("column #{index} has an empty name")));
        } else if !seen.insert(name) && !duplicates.contains(&name) {
            duplicates.push(name);
        }
    }
    if count == 0 {
        report.push(Violation::schema("schema has no columns"));
    }
    for name in duplicates {
        report.push(Violation::column(name, "column name is not unique"));
    }
}

/// Presence and JSON type of the per-column fields. Returns false when the
/// column is too malformed for typed checks.
fn check_column_fields(label: &str, fields: &Map<String, Value>, report: &mut ValidationReport) -> bool {
    let before = report.violations.len();

    match fields.get("name") {
        None => report.push(Violation::column(label, "missing required field `name`")),
        Some(value) if !value.is_string() => {
            report.push(Violation::column(label, "`name` must be a string"))
        }
        Some(_) => {}
    }

    let declared = match fields.get("inferred_type") {
        None => {
            report.push(Violation::column(label, "missing required field `inferred_type`"));
            None
        }
        Some(Value::String(raw)) => match raw.parse::<InferredType>() {
            Ok(ty) => Some(ty),
            Err(_) => {
                report.push(Violation::column(
                    label,
                    format!("unrecognized inferred_type '{raw}'"),
                ));
                None
            }
        },
        Some(_) => {
            report.push(Violation::column(label, "`inferred_type` must be a string"));
            None
        }
    };

    match fields.get("nullable") {
        None => report.push(Violation::column(label, "missing required field `nullable`")),
        Some(value) if !value.is_boolean() => {
            report.push(Violation::column(label, "`nullable` must be a boolean"))
        }
        Some(_) => {}
    }
    match fields.get("null_rate") {
        None => report.push(Violation::column(label, "missing required field `null_rate`")),
        Some(value) if !value.is_number() => {
            report.push(Violation::column(label, "`null_rate` must be a number"))
        }
        Some(_) => {}
    }

    match fields.get("statistics") {
        None => report.push(Violation::column(label, "missing required field `statistics`")),
        Some(Value::Object(block)) => {
            let keys = block.keys().collect::<Vec<_>>();
            match keys.as_slice() {
                [key] => match key.parse::<InferredType>() {
                    Ok(carried) => {
                        if let Some(declared) = declared
                            && declared != carried
                        {
                            report.push(Violation::column(
                                label,
                                format!(
                                    "declared {declared} but carries {carried} statistics"
                                ),
                            ));
                        }
                    }
                    Err(_) => report.push(Violation::column(
                        label,
                        format!("statistics keyed by unrecognized type '{key}'"),
                    )),
                },
                _ => report.push(Violation::column(
                    label,
                    format!(
                        "`statistics` must hold exactly one block keyed by type, found {}",
                        keys.len()
                    ),
                )),
            }
        }
        Some(_) => report.push(Violation::column(label, "`statistics` must be an object")),
    }

    report.violations.len() == before
}

fn check_profile(column: &ColumnProfile, report: &mut ValidationReport) {
    let name = column.name.as_str();
    if !column.null_rate.is_finite() || !(0.0..=1.0).contains(&column.null_rate) {
        report.push(Violation::column(
            name,
            format!("null_rate {} is outside [0, 1]", column.null_rate),
        ));
    } else if !column.nullable && column.null_rate > 0.0 {
        report.push(Violation::column(
            name,
            format!("null_rate is {} but the column is not nullable", column.null_rate),
        ));
    }

    match &column.statistics {
        ColumnStatistics::Numeric(stats) => {
            let fields = [
                ("min", stats.min),
                ("max", stats.max),
                ("mean", stats.mean),
                ("std_dev", stats.std_dev),
                ("p25", stats.p25),
                ("p50", stats.p50),
                ("p75", stats.p75),
            ];
            for (field, value) in fields {
                if !value.is_finite() {
                    report.push(Violation::column(name, format!("numeric {field} is not finite")));
                }
            }
            if stats.min > stats.max {
                report.push(Violation::column(
                    name,
                    format!("numeric min {} exceeds max {}", stats.min, stats.max),
                ));
            }
            if stats.std_dev < 0.0 {
                report.push(Violation::column(name, "numeric std_dev is negative"));
            }
            if stats.integer
                && stats.min.is_finite()
                && stats.max.is_finite()
                && (stats.min.fract() != 0.0 || stats.max.fract() != 0.0)
            {
                report.push(Violation::column(
                    name,
                    format!(
                        "integer column bounds [{}, {}] are not whole numbers",
                        stats.min, stats.max
                    ),
                ));
            }
        }
        ColumnStatistics::Datetime(stats) => {
            if stats.min > stats.max {
                report.push(Violation::column(
                    name,
                    format!("datetime min {} exceeds max {}", stats.min, stats.max),
                ));
            }
            if !is_renderable_pattern(&stats.format) {
                report.push(Violation::column(
                    name,
                    format!("datetime format '{}' is not a valid pattern", stats.format),
                ));
            }
        }
        ColumnStatistics::Categorical(stats) => {
            if stats.frequencies.is_empty() {
                report.push(Violation::column(name, "categorical frequency table is empty"));
            } else {
                check_frequencies(name, stats.frequencies.values().copied(), report);
            }
        }
        ColumnStatistics::Text(stats) => {
            if stats.min_length > stats.max_length {
                report.push(Violation::column(
                    name,
                    format!(
                        "text min_length {} exceeds max_length {}",
                        stats.min_length, stats.max_length
                    ),
                ));
            }
            if !stats.mean_length.is_finite() || stats.mean_length < 0.0 {
                report.push(Violation::column(name, "text mean_length is invalid"));
            }
            if let Some(frequencies) = &stats.frequencies {
                if frequencies.is_empty() {
                    report.push(Violation::column(name, "text frequency table is empty"));
                } else {
                    check_frequencies(name, frequencies.values().copied(), report);
                }
            }
        }
    }
}

fn check_frequencies(name: &str, frequencies: impl Iterator<Item = f64>, report: &mut ValidationReport) {
    let mut total = 0.0;
    let mut out_of_range = false;
    for frequency in frequencies {
        if !frequency.is_finite() || !(0.0..=1.0).contains(&frequency) {
            out_of_range = true;
        }
        total += frequency;
    }
    if out_of_range {
        report.push(Violation::column(name, "frequencies must lie within [0, 1]"));
    }
    if (total - 1.0).abs() > FREQUENCY_TOLERANCE {
        report.push(Violation::column(
            name,
            format!("frequencies sum to {total}, expected 1"),
        ));
    }
}
