//! Schema-driven synthetic row sampling.
//!
//! Every row draws from its own ChaCha8 stream seeded from the base seed and
//! the row index, so row `i` is the same whether 10 or 10,000 rows are
//! requested. Within a row, columns are sampled in schema order and every
//! cell starts with exactly one null-check draw; a missing cell makes no
//! further draws.

use std::{collections::BTreeMap, f64::consts::TAU};

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    config::{GenerateOptions, NumericModel},
    data::{MAX_DECIMALS, Value, pattern_has_time, render_epoch},
    error::{Error, Result},
    schema::{ColumnProfile, ColumnStatistics, DatetimeStats, NumericStats, Schema, TextStats},
    validator,
};

pub const DEFAULT_SEED: u64 = 42;
pub const PREVIEW_ROWS: usize = 5;

const SECONDS_PER_DAY: i64 = 86_400;

/// Mixes the base seed with a row index into an independent row seed.
fn hash_row_seed(seed: u64, row_index: u64) -> u64 {
    let mut hash = seed ^ row_index.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    hash ^ (hash >> 32)
}

/// Samples synthetic rows from a validated schema.
#[derive(Debug, Clone)]
pub struct RowGenerator<'a> {
    schema: &'a Schema,
    options: GenerateOptions,
}

impl<'a> RowGenerator<'a> {
    /// Refuses schemas that carry validation violations.
    pub fn new(schema: &'a Schema, options: GenerateOptions) -> Result<Self> {
        let report = validator::validate(schema);
        if !report.is_valid() {
            return Err(Error::ValidationFailure(report.into_violations()));
        }
        Ok(Self { schema, options })
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Row `index` of the sequence identified by `seed`.
    pub fn row(&self, seed: u64, index: u64) -> Vec<Value> {
        let mut rng = ChaCha8Rng::seed_from_u64(hash_row_seed(seed, index));
        self.schema
            .columns
            .iter()
            .map(|column| sample_cell(column, self.options.numeric_model, &mut rng))
            .collect()
    }

    /// Unbounded, lazily sampled row sequence.
    pub fn rows(&self, seed: u64) -> impl Iterator<Item = Vec<Value>> + '_ {
        (0u64..).map(move |index| self.row(seed, index))
    }

    pub fn generate(&self, row_count: usize, seed: u64) -> Vec<Vec<Value>> {
        debug!(
            "Generating {row_count} row(s) across {} column(s) with seed {seed}",
            self.schema.columns.len()
        );
        self.rows(seed).take(row_count).collect()
    }

    pub fn preview(&self, seed: u64) -> Vec<Vec<Value>> {
        self.generate(PREVIEW_ROWS, seed)
    }
}

/// Generates `row_count` rows with the default numeric model.
pub fn generate(schema: &Schema, row_count: usize, seed: u64) -> Result<Vec<Vec<Value>>> {
    Ok(RowGenerator::new(schema, GenerateOptions::default())?.generate(row_count, seed))
}

/// Exactly [`PREVIEW_ROWS`] rows with the default numeric model.
pub fn preview(schema: &Schema, seed: u64) -> Result<Vec<Vec<Value>>> {
    Ok(RowGenerator::new(schema, GenerateOptions::default())?.preview(seed))
}

fn sample_cell(column: &ColumnProfile, model: NumericModel, rng: &mut ChaCha8Rng) -> Value {
    let null_draw = rng.random::<f64>();
    if column.degenerate || column.statistics.is_degenerate() || null_draw < column.null_rate {
        return Value::Missing;
    }
    match &column.statistics {
        ColumnStatistics::Numeric(stats) => sample_numeric(stats, model, rng),
        ColumnStatistics::Datetime(stats) => sample_datetime(stats, rng),
        ColumnStatistics::Categorical(stats) => weighted_choice(&stats.frequencies, rng)
            .map(|value| Value::Text(value.to_string()))
            .unwrap_or(Value::Missing),
        ColumnStatistics::Text(stats) => sample_text(stats, rng),
    }
}

fn sample_numeric(stats: &NumericStats, model: NumericModel, rng: &mut ChaCha8Rng) -> Value {
    let raw = match model {
        NumericModel::Normal => {
            if stats.std_dev > 0.0 && stats.std_dev.is_finite() {
                stats.mean + stats.std_dev * standard_normal(rng)
            } else {
                stats.mean
            }
        }
        NumericModel::Quantile => inverse_cdf(stats, rng.random::<f64>()),
    };
    numeric_value(stats, raw.clamp(stats.min, stats.max))
}

/// Box-Muller transform over two uniform draws.
fn standard_normal(rng: &mut ChaCha8Rng) -> f64 {
    let u1 = rng.random::<f64>();
    let u2 = rng.random::<f64>();
    (-2.0 * (1.0 - u1).ln()).sqrt() * (TAU * u2).cos()
}

/// Piecewise-linear inverse CDF through min, the quartiles and max.
fn inverse_cdf(stats: &NumericStats, u: f64) -> f64 {
    let knots = [
        (0.0, stats.min),
        (0.25, stats.p25),
        (0.5, stats.p50),
        (0.75, stats.p75),
        (1.0, stats.max),
    ];
    for pair in knots.windows(2) {
        let (q0, v0) = pair[0];
        let (q1, v1) = pair[1];
        if u <= q1 {
            return v0 + (v1 - v0) * ((u - q0) / (q1 - q0));
        }
    }
    stats.max
}

fn numeric_value(stats: &NumericStats, value: f64) -> Value {
    if stats.integer {
        // Validation guarantees whole bounds, so `lo <= hi` whenever min <= max.
        let (lo, hi) = (stats.min.ceil(), stats.max.floor());
        let rounded = if lo <= hi { value.round().clamp(lo, hi) } else { lo };
        return Value::Integer(rounded as i64);
    }
    let factor = 10f64.powi(stats.decimals.min(MAX_DECIMALS) as i32);
    let rounded = (value * factor).round() / factor;
    Value::Float(rounded.clamp(stats.min, stats.max))
}

/// Date-only formats draw whole days so the last observed date is as likely
/// as any other.
fn sample_datetime(stats: &DatetimeStats, rng: &mut ChaCha8Rng) -> Value {
    let seconds = if pattern_has_time(&stats.format) {
        rng.random_range(stats.min..=stats.max)
    } else {
        let first_day = stats.min.div_euclid(SECONDS_PER_DAY);
        let last_day = stats.max.div_euclid(SECONDS_PER_DAY);
        rng.random_range(first_day..=last_day) * SECONDS_PER_DAY
    };
    render_epoch(seconds, &stats.format)
        .map(Value::DateTime)
        .unwrap_or(Value::Missing)
}

/// One uniform draw against cumulative weights in key order. Falls back to
/// the last entry when rounding leaves the draw past the final boundary.
fn weighted_choice<'t>(table: &'t BTreeMap<String, f64>, rng: &mut ChaCha8Rng) -> Option<&'t str> {
    let total = table.values().sum::<f64>();
    let target = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (value, weight) in table {
        cumulative += weight;
        if target < cumulative {
            return Some(value);
        }
    }
    table.keys().next_back().map(String::as_str)
}

fn sample_text(stats: &TextStats, rng: &mut ChaCha8Rng) -> Value {
    if let Some(frequencies) = stats.frequencies.as_ref().filter(|table| !table.is_empty()) {
        return weighted_choice(frequencies, rng)
            .map(|value| Value::Text(value.to_string()))
            .unwrap_or(Value::Missing);
    }
    if !stats.values.is_empty() {
        let index = rng.random_range(0..stats.values.len());
        return Value::Text(stats.values[index].clone());
    }
    let length = rng.random_range(stats.min_length..=stats.max_length);
    let text = (0..length)
        .map(|_| char::from(b'a' + rng.random_range(0..26u8)))
        .collect();
    Value::Text(text)
}
