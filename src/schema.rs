//! Schema model, construction, and JSON interchange.
//!
//! This module owns the [`Schema`] struct (the durable contract between
//! profiling and generation), the per-column [`ColumnProfile`], and the
//! [`ColumnStatistics`] tagged union whose variant *is* the column's inferred
//! type. [`SchemaBuilder`] runs the classifier and profiler over raw columns.
//!
//! ## Document shape
//!
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "row_count": 3,
//!   "source_had_header": true,
//!   "columns": [
//!     { "name": "a", "inferred_type": "numeric", "nullable": false,
//!       "null_rate": 0.0, "statistics": { "numeric": { "min": 1.0, ... } } }
//!   ]
//! }
//! ```

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    fs::File,
    io::{BufReader, Read},
    path::Path,
    str::FromStr,
};

use anyhow::{Context, anyhow};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    classify::{self, Observation},
    config::InferenceConfig,
    data::is_missing,
    dataset::RawTable,
    error::{Error, Result},
    profiler, validator,
};

pub const CURRENT_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredType {
    Numeric,
    Datetime,
    Categorical,
    Text,
}

impl InferredType {
    pub const ALL: [InferredType; 4] = [
        InferredType::Numeric,
        InferredType::Datetime,
        InferredType::Categorical,
        InferredType::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InferredType::Numeric => "numeric",
            InferredType::Datetime => "datetime",
            InferredType::Categorical => "categorical",
            InferredType::Text => "text",
        }
    }
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InferredType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        InferredType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == value)
            .ok_or_else(|| {
                anyhow!(
                    "Unrecognized inferred_type '{value}'. Expected one of: numeric, datetime, categorical, text"
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    /// Values that parsed as numbers.
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    /// Every observed value was an integer literal.
    #[serde(default)]
    pub integer: bool,
    /// Widest fractional part observed, used to round generated floats.
    #[serde(default)]
    pub decimals: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatetimeStats {
    pub count: usize,
    /// Earliest timestamp, Unix epoch seconds.
    pub min: i64,
    /// Latest timestamp, Unix epoch seconds.
    pub max: i64,
    /// strftime pattern the observed values were written in.
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalStats {
    /// Observed value -> share of non-missing rows.
    pub frequencies: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStats {
    pub min_length: usize,
    pub max_length: usize,
    pub mean_length: f64,
    /// Kept when cardinality is moderate; sampled like a categorical column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequencies: Option<BTreeMap<String, f64>>,
    /// Observed values sampled with replacement when no frequency table is kept.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// Type-specific statistics; the variant doubles as the column's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnStatistics {
    Numeric(NumericStats),
    Datetime(DatetimeStats),
    Categorical(CategoricalStats),
    Text(TextStats),
}

impl ColumnStatistics {
    pub fn inferred_type(&self) -> InferredType {
        match self {
            ColumnStatistics::Numeric(_) => InferredType::Numeric,
            ColumnStatistics::Datetime(_) => InferredType::Datetime,
            ColumnStatistics::Categorical(_) => InferredType::Categorical,
            ColumnStatistics::Text(_) => InferredType::Text,
        }
    }

    /// True when the statistics were computed from zero usable values.
    pub fn is_degenerate(&self) -> bool {
        match self {
            ColumnStatistics::Numeric(stats) => stats.count == 0,
            ColumnStatistics::Datetime(stats) => stats.count == 0,
            ColumnStatistics::Categorical(stats) => stats.frequencies.is_empty(),
            ColumnStatistics::Text(stats) => {
                stats.max_length == 0
                    && stats.values.is_empty()
                    && stats.frequencies.as_ref().is_none_or(BTreeMap::is_empty)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColumnRecord", into = "ColumnRecord")]
pub struct ColumnProfile {
    pub name: String,
    pub nullable: bool,
    pub null_rate: f64,
    /// No usable values were observed; generation always emits missing.
    pub degenerate: bool,
    pub statistics: ColumnStatistics,
}

impl ColumnProfile {
    pub fn inferred_type(&self) -> InferredType {
        self.statistics.inferred_type()
    }
}

/// On-disk form of a column. `inferred_type` is stored next to the
/// statistics block and must agree with its key.
#[derive(Serialize, Deserialize)]
struct ColumnRecord {
    name: String,
    inferred_type: InferredType,
    nullable: bool,
    null_rate: f64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    degenerate: bool,
    statistics: ColumnStatistics,
}

impl TryFrom<ColumnRecord> for ColumnProfile {
    type Error = String;

    fn try_from(record: ColumnRecord) -> Result<Self, Self::Error> {
        let carried = record.statistics.inferred_type();
        if record.inferred_type != carried {
            return Err(format!(
                "column '{}' declares inferred_type {} but carries {} statistics",
                record.name, record.inferred_type, carried
            ));
        }
        Ok(ColumnProfile {
            name: record.name,
            nullable: record.nullable,
            null_rate: record.null_rate,
            degenerate: record.degenerate,
            statistics: record.statistics,
        })
    }
}

impl From<ColumnProfile> for ColumnRecord {
    fn from(profile: ColumnProfile) -> Self {
        ColumnRecord {
            inferred_type: profile.inferred_type(),
            name: profile.name,
            nullable: profile.nullable,
            null_rate: profile.null_rate,
            degenerate: profile.degenerate,
            statistics: profile.statistics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    pub row_count: usize,
    pub source_had_header: bool,
    pub columns: Vec<ColumnProfile>,
}

impl Schema {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn to_json_string(&self) -> Result<String> {
        let mut schema = self.clone();
        if schema.schema_version.is_none() {
            schema.schema_version = Some(CURRENT_SCHEMA_VERSION.to_string());
        }
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    /// Parses a schema document. A document that is not JSON at all fails
    /// with [`Error::UnparseableSchema`]; a well-formed document with defects
    /// fails with [`Error::ValidationFailure`] listing every violation.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let document: serde_json::Value = serde_json::from_str(text)?;
        Self::from_document(document)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let document: serde_json::Value = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    fn from_document(document: serde_json::Value) -> Result<Self> {
        let report = validator::validate_document(&document);
        if !report.is_valid() {
            return Err(Error::ValidationFailure(report.into_violations()));
        }
        Ok(serde_json::from_value(document)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = self.to_json_string().context("Serializing schema to JSON")?;
        std::fs::write(path, text).with_context(|| format!("Writing schema file {path:?}"))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("Loading schema from {path:?}"))
    }
}

/// Runs classification and profiling over every column of a dataset.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    config: InferenceConfig,
}

impl SchemaBuilder {
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }

    pub fn build_table(&self, table: &RawTable) -> Result<Schema> {
        let header = table.has_header.then_some(table.names.as_slice());
        self.build(header, &table.columns)
    }

    /// Builds a schema from column-major raw values. `header` carries the
    /// header row when the source had one; otherwise columns are named
    /// `col_<index>`.
    pub fn build<S: AsRef<str>>(&self, header: Option<&[String]>, columns: &[Vec<S>]) -> Result<Schema> {
        if columns.is_empty() {
            return Err(Error::malformed("input", "no columns to profile"));
        }
        if let Some(names) = header
            && names.len() != columns.len()
        {
            return Err(Error::malformed(
                "header",
                format!(
                    "header has {} field(s) but data has {} column(s)",
                    names.len(),
                    columns.len()
                ),
            ));
        }
        let names = resolve_column_names(header, columns.len());
        let row_count = columns[0].len();
        for (name, values) in names.iter().zip(columns) {
            if values.len() != row_count {
                return Err(Error::malformed(
                    format!("column '{name}'"),
                    format!("has {} value(s), expected {row_count}", values.len()),
                ));
            }
        }

        let profiles = names
            .into_iter()
            .zip(columns)
            .map(|(name, values)| self.profile_column(name, values, row_count))
            .collect();

        Ok(Schema {
            schema_version: None,
            row_count,
            source_had_header: header.is_some(),
            columns: profiles,
        })
    }

    fn profile_column<S: AsRef<str>>(&self, name: String, values: &[S], row_count: usize) -> ColumnProfile {
        let observation = Observation::collect(values, &self.config);
        let inferred = classify::decide(&observation, &self.config);
        debug!(
            "Column '{name}' classified as {inferred} ({} distinct of {} non-missing)",
            observation.distinct, observation.non_missing
        );
        let statistics = profiler::profile(values, inferred, &self.config);
        let missing = values
            .iter()
            .filter(|raw| is_missing(raw.as_ref(), &self.config))
            .count();
        let null_rate = if row_count == 0 {
            1.0
        } else {
            missing as f64 / row_count as f64
        };
        let degenerate = statistics.is_degenerate();
        if degenerate {
            warn!("Column '{name}' has no usable values; it will always generate as missing");
        }
        ColumnProfile {
            name,
            nullable: missing > 0 || degenerate,
            null_rate: if degenerate { 1.0 } else { null_rate },
            degenerate,
            statistics,
        }
    }
}

/// Header text when present, `col_<index>` otherwise. Blank header cells
/// fall back to the synthetic name and repeated names get a numeric suffix.
pub fn resolve_column_names(header: Option<&[String]>, count: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    (0..count)
        .map(|idx| {
            let base = header
                .and_then(|names| names.get(idx))
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("col_{idx}"));
            let mut candidate = base.clone();
            let mut suffix = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{base}_{suffix}");
                suffix += 1;
            }
            candidate
        })
        .collect()
}
