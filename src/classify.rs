//! Column type inference.
//!
//! Classification is a fixed, ordered table of `(rule, type)` pairs evaluated
//! against one pass of observations over the non-missing values. The first
//! rule that holds decides the type; later rules are never consulted, so a
//! column that is both numeric-looking and low-cardinality is numeric.

use std::collections::HashSet;

use crate::{
    config::InferenceConfig,
    data::{is_missing, parse_datetime, parse_numeric},
    schema::InferredType,
};

/// Counts gathered from a single scan of a column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    pub total: usize,
    pub non_missing: usize,
    pub numeric_matches: usize,
    pub datetime_matches: usize,
    pub distinct: usize,
}

impl Observation {
    pub fn collect<S: AsRef<str>>(values: &[S], config: &InferenceConfig) -> Self {
        let mut observation = Observation {
            total: values.len(),
            ..Observation::default()
        };
        let mut seen = HashSet::new();
        for raw in values {
            let raw = raw.as_ref();
            if is_missing(raw, config) {
                continue;
            }
            let trimmed = raw.trim();
            observation.non_missing += 1;
            if parse_numeric(trimmed).is_some() {
                observation.numeric_matches += 1;
            } else if parse_datetime(trimmed).is_some() {
                observation.datetime_matches += 1;
            }
            seen.insert(trimmed);
        }
        observation.distinct = seen.len();
        observation
    }

    fn fraction(&self, matches: usize) -> f64 {
        if self.non_missing == 0 {
            0.0
        } else {
            matches as f64 / self.non_missing as f64
        }
    }

    pub fn distinct_ratio(&self) -> f64 {
        self.fraction(self.distinct)
    }
}

type Rule = fn(&Observation, &InferenceConfig) -> bool;

/// Priority-ordered classification table.
pub const RULES: &[(&str, Rule, InferredType)] = &[
    ("empty", is_empty, InferredType::Text),
    ("numeric", is_numeric, InferredType::Numeric),
    ("datetime", is_datetime, InferredType::Datetime),
    ("categorical", is_categorical, InferredType::Categorical),
];

fn is_empty(observation: &Observation, _config: &InferenceConfig) -> bool {
    observation.non_missing == 0
}

fn is_numeric(observation: &Observation, config: &InferenceConfig) -> bool {
    observation.fraction(observation.numeric_matches) >= config.numeric_threshold
}

// Numeric literals never count toward datetime matches, so a column of plain
// numbers cannot be read as dates here even if the numeric rule were skipped.
fn is_datetime(observation: &Observation, config: &InferenceConfig) -> bool {
    observation.fraction(observation.datetime_matches) >= config.datetime_threshold
}

fn is_categorical(observation: &Observation, config: &InferenceConfig) -> bool {
    if observation.distinct > config.max_categories {
        return false;
    }
    observation.distinct <= config.small_distinct_count
        || observation.distinct_ratio() <= config.max_distinct_ratio
}

/// Classifies an already-collected observation.
pub fn decide(observation: &Observation, config: &InferenceConfig) -> InferredType {
    RULES
        .iter()
        .find(|(_, rule, _)| rule(observation, config))
        .map(|(_, _, ty)| *ty)
        .unwrap_or(InferredType::Text)
}

/// Assigns one semantic type to a column of raw cell values.
pub fn classify<S: AsRef<str>>(values: &[S], config: &InferenceConfig) -> InferredType {
    decide(&Observation::collect(values, config), config)
}
