use std::{fmt, sync::OnceLock};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::InferenceConfig;

/// Fraction digits beyond this are not reproduced on output.
pub const MAX_DECIMALS: u32 = 12;

/// Date/time layouts tried in order; the first that parses a value wins.
pub const DATETIME_PATTERNS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y",
    "%m/%d/%Y %H:%M:%S",
    "%Y/%m/%d",
];

/// One synthetic cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Missing,
    Integer(i64),
    Float(f64),
    DateTime(String),
    Text(String),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{f:.0}")
                } else {
                    f.to_string()
                }
            }
            Value::DateTime(s) | Value::Text(s) => s.clone(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// True when `raw` is empty after trimming or is a configured placeholder.
pub fn is_missing(raw: &str, config: &InferenceConfig) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return true;
    }
    config.is_missing_token(&trimmed.to_ascii_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericLiteral {
    pub value: f64,
    pub integer: bool,
    pub decimals: u32,
}

fn numeric_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").ok())
        .as_ref()
}

/// Parses an integer or floating-point literal: optional sign, optional
/// decimal point, optional exponent. `inf`/`NaN` spellings are rejected.
pub fn parse_numeric(value: &str) -> Option<NumericLiteral> {
    let trimmed = value.trim();
    if !numeric_pattern()?.is_match(trimmed) {
        return None;
    }
    let parsed: f64 = trimmed.parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    let (mantissa, exponent) = match trimmed.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i64>().unwrap_or(0)),
        None => (trimmed, 0),
    };
    let fraction_len = mantissa
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len() as i64);
    // The exponent shifts the point: `15e-4` has four fraction digits.
    let decimals = fraction_len
        .saturating_sub(exponent)
        .clamp(0, i64::from(MAX_DECIMALS)) as u32;
    let integer = trimmed.parse::<i64>().is_ok();
    Some(NumericLiteral {
        value: parsed,
        integer,
        decimals,
    })
}

/// Parses `value` against [`DATETIME_PATTERNS`], returning the timestamp and
/// the index of the first matching pattern.
pub fn parse_datetime(value: &str) -> Option<(NaiveDateTime, usize)> {
    let trimmed = value.trim();
    DATETIME_PATTERNS
        .iter()
        .enumerate()
        .find_map(|(idx, pattern)| parse_with_pattern(trimmed, pattern).map(|dt| (dt, idx)))
}

pub fn parse_with_pattern(value: &str, pattern: &str) -> Option<NaiveDateTime> {
    if pattern_has_time(pattern) {
        NaiveDateTime::parse_from_str(value, pattern).ok()
    } else {
        NaiveDate::parse_from_str(value, pattern)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }
}

/// True when `pattern` carries a time-of-day component.
pub fn pattern_has_time(pattern: &str) -> bool {
    ["%H", "%I", "%M", "%S", "%T", "%R"]
        .iter()
        .any(|spec| pattern.contains(spec))
}

pub fn datetime_to_epoch(dt: &NaiveDateTime) -> i64 {
    dt.and_utc().timestamp()
}

pub fn epoch_to_datetime(seconds: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc())
}

/// True when `pattern` renders without strftime errors.
pub fn is_renderable_pattern(pattern: &str) -> bool {
    use chrono::format::{Item, StrftimeItems};
    !pattern.is_empty() && !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// Renders epoch seconds in `pattern`; `None` when either is unusable.
pub fn render_epoch(seconds: i64, pattern: &str) -> Option<String> {
    use std::fmt::Write as _;
    let dt = epoch_to_datetime(seconds)?;
    let mut rendered = String::new();
    write!(rendered, "{}", dt.format(pattern)).ok()?;
    Some(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_numeric_accepts_signs_decimals_and_exponents() {
        let cases = [
            ("42", 42.0, true, 0),
            ("-7", -7.0, true, 0),
            ("+3.25", 3.25, false, 2),
            (".5", 0.5, false, 1),
            ("6.", 6.0, false, 0),
            ("1.5e3", 1500.0, false, 0),
            ("2E-2", 0.02, false, 2),
            ("1.5e-3", 0.0015, false, 4),
            ("10e-4", 0.001, false, 4),
            ("3.25E+1", 32.5, false, 1),
            ("1e-20", 1e-20, false, MAX_DECIMALS),
        ];
        for (raw, value, integer, decimals) in cases {
            let parsed = parse_numeric(raw).unwrap_or_else(|| panic!("{raw} should parse"));
            assert_eq!(parsed.value, value, "value for {raw}");
            assert_eq!(parsed.integer, integer, "integer flag for {raw}");
            assert_eq!(parsed.decimals, decimals, "decimals for {raw}");
        }
    }

    #[test]
    fn parse_numeric_rejects_non_literals() {
        for raw in ["", "abc", "1,000", "inf", "NaN", "1.2.3", "--1", "e5", "$12"] {
            assert!(parse_numeric(raw).is_none(), "{raw} should not parse");
        }
    }

    #[test]
    fn parse_datetime_reports_first_matching_pattern() {
        let (dt, idx) = parse_datetime("2020-01-02").expect("iso date");
        assert_eq!(DATETIME_PATTERNS[idx], "%Y-%m-%d");
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2020-01-02 00:00:00");

        let (_, idx) = parse_datetime("2020-01-02T03:04:05").expect("iso datetime");
        assert_eq!(DATETIME_PATTERNS[idx], "%Y-%m-%dT%H:%M:%S");

        let (_, idx) = parse_datetime("12/31/2021").expect("us date");
        assert_eq!(DATETIME_PATTERNS[idx], "%m/%d/%Y");

        assert!(parse_datetime("31/12/2021").is_none());
        assert!(parse_datetime("20200102").is_none());
    }

    #[test]
    fn epoch_round_trip_renders_in_pattern() {
        let (dt, _) = parse_datetime("2020-01-01 12:30:00").expect("parse");
        let epoch = datetime_to_epoch(&dt);
        assert_eq!(render_epoch(epoch, "%Y-%m-%d %H:%M:%S").as_deref(), Some("2020-01-01 12:30:00"));
        assert_eq!(render_epoch(epoch, "%m/%d/%Y").as_deref(), Some("01/01/2020"));
    }

    #[test]
    fn missing_detection_uses_configured_tokens() {
        let config = InferenceConfig::default();
        assert!(is_missing("", &config));
        assert!(is_missing("   ", &config));
        assert!(is_missing("N/A", &config));
        assert!(is_missing(" null ", &config));
        assert!(!is_missing("0", &config));
    }

    #[test]
    fn value_display_matches_csv_output() {
        assert_eq!(Value::Missing.as_display(), "");
        assert_eq!(Value::Integer(-3).as_display(), "-3");
        assert_eq!(Value::Float(2.0).as_display(), "2");
        assert_eq!(Value::Float(2.5).as_display(), "2.5");
        assert_eq!(Value::Text("x".to_string()).to_string(), "x");
    }

    #[test]
    fn strftime_validation_flags_bad_patterns() {
        assert!(is_renderable_pattern("%Y-%m-%d"));
        assert!(!is_renderable_pattern(""));
        assert!(!is_renderable_pattern("%Y-%"));
    }
}
