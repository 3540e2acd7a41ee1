//! Tunable thresholds for profiling and options for generation.
//!
//! Every cut-off used by the classifier and profiler lives in
//! [`InferenceConfig`] so it can be overridden from a YAML file instead of
//! being buried as a literal. Missing keys fall back to the defaults below.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NUMERIC_THRESHOLD: f64 = 0.9;
pub const DEFAULT_DATETIME_THRESHOLD: f64 = 0.9;
pub const DEFAULT_MAX_DISTINCT_RATIO: f64 = 0.05;
pub const DEFAULT_SMALL_DISTINCT_COUNT: usize = 10;
pub const DEFAULT_MAX_CATEGORIES: usize = 1000;
pub const DEFAULT_TEXT_FREQUENCY_LIMIT: usize = 200;
pub const DEFAULT_TEXT_BAG_LIMIT: usize = 1000;

const DEFAULT_MISSING_TOKENS: &[&str] = &["na", "n/a", "null", "nan", "none", "#n/a"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceConfig {
    /// Fraction of non-missing values that must parse as numbers.
    pub numeric_threshold: f64,
    /// Fraction of non-missing values that must match a datetime pattern.
    pub datetime_threshold: f64,
    /// Distinct/non-missing ratio at or below which a column is categorical.
    pub max_distinct_ratio: f64,
    /// Columns with at most this many distinct values are categorical
    /// regardless of ratio.
    pub small_distinct_count: usize,
    /// Hard ceiling on the size of a categorical frequency table.
    pub max_categories: usize,
    /// Text columns up to this many distinct values keep a frequency table.
    pub text_frequency_limit: usize,
    /// Maximum number of observed values retained in a text bag.
    pub text_bag_limit: usize,
    /// Lowercase tokens treated as missing in addition to empty cells.
    pub missing_tokens: Vec<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            numeric_threshold: DEFAULT_NUMERIC_THRESHOLD,
            datetime_threshold: DEFAULT_DATETIME_THRESHOLD,
            max_distinct_ratio: DEFAULT_MAX_DISTINCT_RATIO,
            small_distinct_count: DEFAULT_SMALL_DISTINCT_COUNT,
            max_categories: DEFAULT_MAX_CATEGORIES,
            text_frequency_limit: DEFAULT_TEXT_FREQUENCY_LIMIT,
            text_bag_limit: DEFAULT_TEXT_BAG_LIMIT,
            missing_tokens: DEFAULT_MISSING_TOKENS
                .iter()
                .map(|token| token.to_string())
                .collect(),
        }
    }
}

impl InferenceConfig {
    pub fn ensure_valid(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.numeric_threshold),
            "numeric_threshold must be within [0, 1]"
        );
        ensure!(
            (0.0..=1.0).contains(&self.datetime_threshold),
            "datetime_threshold must be within [0, 1]"
        );
        ensure!(
            (0.0..=1.0).contains(&self.max_distinct_ratio),
            "max_distinct_ratio must be within [0, 1]"
        );
        ensure!(self.max_categories > 0, "max_categories must be positive");
        Ok(())
    }

    pub fn is_missing_token(&self, lowered: &str) -> bool {
        self.missing_tokens.iter().any(|token| token == lowered)
    }
}

/// Parametric family used when sampling numeric columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum NumericModel {
    /// Normal around the stored mean and standard deviation, clamped to the
    /// observed range.
    #[default]
    Normal,
    /// Piecewise-linear inverse CDF through min, quartiles and max.
    Quantile,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateOptions {
    pub numeric_model: NumericModel,
}

/// Layout of a `--config` file: both sections are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub inference: InferenceConfig,
    pub generate: GenerateOptions,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: Config = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        config.inference.ensure_valid()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
