//! Sample identity, data-source schema, and update-line formatting.
//!
//! A sample arrives as an identity tuple (who produced it), a schema (what
//! the values mean), a slice of values, and a unix timestamp. Everything the
//! rest of the crate consumes is derived from these types.

use crate::error::{RrdSinkError, RrdSinkResult};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;

/// Identity tuple naming one metric stream.
///
/// `host`, `plugin`, and `type_name` are non-empty; the two instance fields
/// may be empty and are then left out of the derived archive path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub host: String,
    pub plugin: String,
    pub plugin_instance: String,
    pub type_name: String,
    pub type_instance: String,
}

impl Identity {
    pub fn new(
        host: impl Into<String>,
        plugin: impl Into<String>,
        plugin_instance: impl Into<String>,
        type_name: impl Into<String>,
        type_instance: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            plugin: plugin.into(),
            plugin_instance: plugin_instance.into(),
            type_name: type_name.into(),
            type_instance: type_instance.into(),
        }
    }
}

/// Kind of one data source within an archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSourceKind {
    /// Ever-increasing value; the engine stores the rate of change.
    Counter,
    /// Point-in-time value stored as-is.
    Gauge,
}

impl DataSourceKind {
    /// Textual form used in DS definitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceKind::Counter => "COUNTER",
            DataSourceKind::Gauge => "GAUGE",
        }
    }
}

impl FromStr for DataSourceKind {
    type Err = RrdSinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("counter") {
            Ok(DataSourceKind::Counter)
        } else if s.eq_ignore_ascii_case("gauge") {
            Ok(DataSourceKind::Gauge)
        } else {
            Err(RrdSinkError::UnknownDataSourceKind(s.to_string()))
        }
    }
}

/// One data-source descriptor from a sample schema.
///
/// `min`/`max` of `None` mean "unknown" and render as `U`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    pub kind: DataSourceKind,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl DataSource {
    pub fn new(name: impl Into<String>, kind: DataSourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            min: None,
            max: None,
        }
    }

    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }
}

/// One sample value, matched positionally against the schema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Counter(u64),
    Gauge(f64),
}

/// Format one sample as an engine update line: `<time>:<value>[:<value>…]`.
///
/// Counters render as unsigned decimals, gauges as locale-independent
/// decimals, and non-finite gauges as the engine's `U` unknown literal.
pub fn format_update_line(values: &[Value], time: u64) -> RrdSinkResult<String> {
    if values.is_empty() {
        return Err(RrdSinkError::ValueCountMismatch {
            expected: 1,
            actual: 0,
        });
    }

    let mut line = time.to_string();
    for value in values {
        match value {
            Value::Counter(v) => {
                let _ = write!(line, ":{v}");
            }
            Value::Gauge(v) if v.is_finite() => {
                let _ = write!(line, ":{v}");
            }
            Value::Gauge(_) => line.push_str(":U"),
        }
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_case_insensitively() {
        assert_eq!(
            "counter".parse::<DataSourceKind>().unwrap(),
            DataSourceKind::Counter
        );
        assert_eq!(
            "GAUGE".parse::<DataSourceKind>().unwrap(),
            DataSourceKind::Gauge
        );
        assert_eq!(DataSourceKind::Counter.as_str(), "COUNTER");
    }

    #[test]
    fn unknown_kind_rejected() {
        let err = "derive".parse::<DataSourceKind>().unwrap_err();
        assert!(matches!(err, RrdSinkError::UnknownDataSourceKind(_)));
    }

    #[test]
    fn update_line_mixed_values() {
        let line = format_update_line(
            &[Value::Counter(42), Value::Gauge(0.25), Value::Gauge(7.0)],
            1700000000,
        )
        .unwrap();
        assert_eq!(line, "1700000000:42:0.25:7");
    }

    #[test]
    fn update_line_nan_renders_unknown() {
        let line = format_update_line(&[Value::Gauge(f64::NAN)], 100).unwrap();
        assert_eq!(line, "100:U");
        let line = format_update_line(&[Value::Gauge(f64::INFINITY)], 100).unwrap();
        assert_eq!(line, "100:U");
    }

    #[test]
    fn update_line_requires_values() {
        assert!(format_update_line(&[], 100).is_err());
    }
}
