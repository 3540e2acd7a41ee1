//! Per-column statistical summaries.
//!
//! Each inferred type has its own accumulator. Missing cells are skipped
//! everywhere; cells that do not parse as the column's type (tolerated by
//! the classifier's thresholds) are skipped as well.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::{
    config::InferenceConfig,
    data::{DATETIME_PATTERNS, datetime_to_epoch, is_missing, parse_datetime, parse_numeric},
    schema::{
        CategoricalStats, ColumnStatistics, DatetimeStats, InferredType, NumericStats, TextStats,
    },
};

/// Computes the statistics block for `values` under `inferred`.
pub fn profile<S: AsRef<str>>(
    values: &[S],
    inferred: InferredType,
    config: &InferenceConfig,
) -> ColumnStatistics {
    let present = values
        .iter()
        .map(|raw| raw.as_ref())
        .filter(|raw| !is_missing(raw, config))
        .map(str::trim)
        .collect::<Vec<_>>();
    match inferred {
        InferredType::Numeric => ColumnStatistics::Numeric(profile_numeric(&present)),
        InferredType::Datetime => ColumnStatistics::Datetime(profile_datetime(&present)),
        InferredType::Categorical => ColumnStatistics::Categorical(CategoricalStats {
            frequencies: frequency_table(&present),
        }),
        InferredType::Text => ColumnStatistics::Text(profile_text(&present, config)),
    }
}

/// Streaming moments (Welford) plus the retained values for order statistics.
#[derive(Debug, Default)]
struct NumericAccumulator {
    values: Vec<f64>,
    mean: f64,
    m2: f64,
    min: Option<f64>,
    max: Option<f64>,
    integer: bool,
    decimals: u32,
}

impl NumericAccumulator {
    fn new() -> Self {
        Self {
            integer: true,
            ..Self::default()
        }
    }

    fn add(&mut self, value: f64, integer: bool, decimals: u32) {
        self.values.push(value);
        let count = self.values.len() as f64;
        let delta = value - self.mean;
        self.mean += delta / count;
        self.m2 += delta * (value - self.mean);
        self.min = Some(self.min.map_or(value, |current| current.min(value)));
        self.max = Some(self.max.map_or(value, |current| current.max(value)));
        self.integer &= integer;
        self.decimals = self.decimals.max(decimals);
    }

    /// Population standard deviation.
    fn std_dev(&self) -> f64 {
        if self.values.len() < 2 {
            return 0.0;
        }
        (self.m2 / self.values.len() as f64).max(0.0).sqrt()
    }

    fn finish(mut self) -> NumericStats {
        let (Some(min), Some(max)) = (self.min, self.max) else {
            return NumericStats {
                count: 0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                std_dev: 0.0,
                p25: 0.0,
                p50: 0.0,
                p75: 0.0,
                integer: false,
                decimals: 0,
            };
        };
        let std_dev = self.std_dev();
        self.values.sort_by(f64::total_cmp);
        NumericStats {
            count: self.values.len(),
            min,
            max,
            mean: self.mean.clamp(min, max),
            std_dev,
            p25: percentile(&self.values, 0.25),
            p50: percentile(&self.values, 0.50),
            p75: percentile(&self.values, 0.75),
            integer: self.integer,
            decimals: if self.integer { 0 } else { self.decimals },
        }
    }
}

/// Linear interpolation between closest ranks over sorted, non-empty input.
fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    let Some(&last) = sorted.last() else {
        return 0.0;
    };
    let rank = quantile * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let (Some(&lo), Some(&hi)) = (sorted.get(lower), sorted.get(upper)) else {
        return last;
    };
    (lo + (hi - lo) * (rank - lower as f64)).clamp(lo, hi)
}

fn profile_numeric(values: &[&str]) -> NumericStats {
    let mut accumulator = NumericAccumulator::new();
    for literal in values.iter().filter_map(|raw| parse_numeric(raw)) {
        accumulator.add(literal.value, literal.integer, literal.decimals);
    }
    accumulator.finish()
}

fn profile_datetime(values: &[&str]) -> DatetimeStats {
    let mut pattern_hits = vec![0usize; DATETIME_PATTERNS.len()];
    let mut bounds: Option<(i64, i64)> = None;
    let mut count = 0usize;
    for (timestamp, pattern) in values.iter().filter_map(|raw| parse_datetime(raw)) {
        let epoch = datetime_to_epoch(&timestamp);
        bounds = Some(match bounds {
            Some((min, max)) => (min.min(epoch), max.max(epoch)),
            None => (epoch, epoch),
        });
        pattern_hits[pattern] += 1;
        count += 1;
    }
    // Most common pattern; ties go to the earlier entry in the pattern list.
    let format_index = pattern_hits
        .iter()
        .enumerate()
        .rev()
        .max_by_key(|(_, hits)| **hits)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let (min, max) = bounds.unwrap_or((0, 0));
    DatetimeStats {
        count,
        min,
        max,
        format: DATETIME_PATTERNS[format_index].to_string(),
    }
}

/// Share of each distinct value among `values`.
fn frequency_table(values: &[&str]) -> BTreeMap<String, f64> {
    let total = values.len() as f64;
    values
        .iter()
        .copied()
        .counts()
        .into_iter()
        .map(|(value, count)| (value.to_string(), count as f64 / total))
        .collect()
}

/// Up to `limit` values taken at even strides across the whole column.
fn stride_sample(values: &[&str], limit: usize) -> Vec<String> {
    let take = limit.min(values.len());
    (0..take)
        .map(|i| values[i * values.len() / take].to_string())
        .collect()
}

fn profile_text(values: &[&str], config: &InferenceConfig) -> TextStats {
    let lengths = values
        .iter()
        .map(|value| value.chars().count())
        .collect::<Vec<_>>();
    let (min_length, max_length) = lengths
        .iter()
        .copied()
        .minmax()
        .into_option()
        .unwrap_or((0, 0));
    let mean_length = if lengths.is_empty() {
        0.0
    } else {
        lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
    };

    let distinct = values.iter().unique().count();
    let (frequencies, bag) = if values.is_empty() {
        (None, Vec::new())
    } else if distinct <= config.text_frequency_limit {
        (Some(frequency_table(values)), Vec::new())
    } else {
        (None, stride_sample(values, config.text_bag_limit))
    };

    TextStats {
        min_length,
        max_length,
        mean_length,
        frequencies,
        values: bag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(values: &[&str]) -> NumericStats {
        match profile(values, InferredType::Numeric, &InferenceConfig::default()) {
            ColumnStatistics::Numeric(stats) => stats,
            other => panic!("expected numeric statistics, got {other:?}"),
        }
    }

    fn text(values: &[String], config: &InferenceConfig) -> TextStats {
        match profile(values, InferredType::Text, config) {
            ColumnStatistics::Text(stats) => stats,
            other => panic!("expected text statistics, got {other:?}"),
        }
    }

    #[test]
    fn numeric_profile_reports_moments_and_quartiles() {
        let stats = numeric(&["1", "2", "3", "4", "", "5"]);
        assert_eq!(stats.count, 5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert!((stats.std_dev - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.p25, 2.0);
        assert_eq!(stats.p50, 3.0);
        assert_eq!(stats.p75, 4.0);
        assert!(stats.integer);
        assert_eq!(stats.decimals, 0);
    }

    #[test]
    fn percentiles_interpolate_between_ranks() {
        let stats = numeric(&["10", "20", "30", "40"]);
        assert_eq!(stats.p25, 17.5);
        assert_eq!(stats.p50, 25.0);
        assert_eq!(stats.p75, 32.5);
    }

    #[test]
    fn zero_variance_column_has_zero_std_dev() {
        let stats = numeric(&["7", "7", "7"]);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.mean, 7.0);
    }

    #[test]
    fn float_columns_remember_widest_fraction() {
        let stats = numeric(&["1.5", "2.25", "3", "bad"]);
        assert_eq!(stats.count, 3);
        assert!(!stats.integer);
        assert_eq!(stats.decimals, 2);
    }

    #[test]
    fn numeric_profile_without_values_is_degenerate() {
        let stats = numeric(&["", "x"]);
        assert_eq!(stats.count, 0);
        assert!(ColumnStatistics::Numeric(stats).is_degenerate());
    }

    #[test]
    fn datetime_profile_tracks_bounds_and_dominant_pattern() {
        let values = ["2020-01-03", "2020-01-01", "01/02/2020", "2020-01-02", ""];
        let ColumnStatistics::Datetime(stats) =
            profile(&values, InferredType::Datetime, &InferenceConfig::default())
        else {
            panic!("expected datetime statistics");
        };
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min, 1_577_836_800);
        assert_eq!(stats.max, 1_577_836_800 + 2 * 86_400);
        assert_eq!(stats.format, "%Y-%m-%d");
    }

    #[test]
    fn datetime_pattern_ties_prefer_earlier_entry() {
        let values = ["01/02/2020", "2020-01-01"];
        let ColumnStatistics::Datetime(stats) =
            profile(&values, InferredType::Datetime, &InferenceConfig::default())
        else {
            panic!("expected datetime statistics");
        };
        assert_eq!(stats.format, "%Y-%m-%d");
    }

    #[test]
    fn categorical_frequencies_cover_observed_values_only() {
        let values = ["red", "blue", "red", "", "red", "green"];
        let ColumnStatistics::Categorical(stats) =
            profile(&values, InferredType::Categorical, &InferenceConfig::default())
        else {
            panic!("expected categorical statistics");
        };
        assert_eq!(stats.frequencies.len(), 3);
        assert_eq!(stats.frequencies["red"], 0.6);
        assert_eq!(stats.frequencies["blue"], 0.2);
        let total: f64 = stats.frequencies.values().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn moderate_cardinality_text_keeps_frequencies() {
        let values = (0..50).map(|i| format!("note {i}")).collect::<Vec<_>>();
        let stats = text(&values, &InferenceConfig::default());
        assert_eq!(stats.min_length, 6);
        assert_eq!(stats.max_length, 7);
        assert!(stats.frequencies.is_some());
        assert!(stats.values.is_empty());
    }

    #[test]
    fn high_cardinality_text_falls_back_to_bag() {
        let config = InferenceConfig {
            text_frequency_limit: 10,
            text_bag_limit: 20,
            ..InferenceConfig::default()
        };
        let values = (0..100).map(|i| format!("row {i}")).collect::<Vec<_>>();
        let stats = text(&values, &config);
        assert!(stats.frequencies.is_none());
        assert_eq!(stats.values.len(), 20);
        assert_eq!(stats.values[0], "row 0");
        assert_eq!(stats.values[1], "row 5");
        assert_eq!(stats.values[19], "row 95");
    }

    #[test]
    fn text_without_bag_keeps_lengths_only() {
        let config = InferenceConfig {
            text_frequency_limit: 0,
            text_bag_limit: 0,
            ..InferenceConfig::default()
        };
        let values = vec!["abc".to_string(), "abcdef".to_string()];
        let stats = text(&values, &config);
        assert!(stats.frequencies.is_none());
        assert!(stats.values.is_empty());
        assert_eq!((stats.min_length, stats.max_length), (3, 6));
        assert_eq!(stats.mean_length, 4.5);
        assert!(!ColumnStatistics::Text(stats).is_degenerate());
    }
}
