//! Runtime configuration — key/value intake from the collector host.
//!
//! The host hands configuration down one `(key, value)` pair at a time; keys
//! are matched case-insensitively. After the last pair, [`Config::finalize`]
//! fills in interval-derived defaults and applies the cache-timeout coupling
//! rules. The finalized value is read-only for the rest of the process.

use crate::error::{RrdSinkError, RrdSinkResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Built-in archive retention schedule: hour, day, week, month, year.
pub const DEFAULT_RRA_TIMESPANS: &[u64] = &[3600, 86400, 604800, 2678400, 31622400];

/// Default rows per round-robin archive.
pub const DEFAULT_RRA_ROWS: u32 = 1200;

/// Default xfiles factor.
pub const DEFAULT_XFF: f64 = 0.1;

/// Sink configuration, populated via [`Config::set`] and sealed by
/// [`Config::finalize`].
///
/// Zero means "unset" for the numeric fields until `finalize` runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seconds a batch may span before it is queued for flushing.
    /// Below 2 the cache is disabled and every sample flushes immediately.
    pub cache_timeout: u64,

    /// Seconds between full cache sweeps (ages out idle entries).
    pub cache_flush_timeout: u64,

    /// Nominal interval between primary data points, in seconds.
    pub step_size: u64,

    /// Maximum gap between samples before a data source reads unknown.
    pub heartbeat: u64,

    /// Rows per round-robin archive.
    pub rra_rows: u32,

    /// Fraction of unknown primary points tolerated per consolidated point.
    pub xff: f64,

    /// Retention timespans in seconds, in configuration order.
    pub rra_timespans: Vec<u64>,

    /// Path prefix for all archive files.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_timeout: 0,
            cache_flush_timeout: 0,
            step_size: 0,
            heartbeat: 0,
            rra_rows: 0,
            xff: DEFAULT_XFF,
            rra_timespans: Vec::new(),
            data_dir: None,
        }
    }
}

impl Config {
    /// Accept one configuration pair from the host.
    ///
    /// Keys are case-insensitive. Unknown keys and unparseable or
    /// out-of-range values are errors that should abort startup.
    pub fn set(&mut self, key: &str, value: &str) -> RrdSinkResult<()> {
        match key.to_ascii_lowercase().as_str() {
            "cachetimeout" => {
                self.cache_timeout = parse_seconds(key, value)?;
            }
            "cacheflush" => {
                self.cache_flush_timeout = parse_seconds(key, value)?;
            }
            "datadir" => {
                let trimmed = value.trim_end_matches('/');
                self.data_dir = if trimmed.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(trimmed))
                };
            }
            "stepsize" => {
                self.step_size = parse_positive_seconds(key, value)?;
            }
            "heartbeat" => {
                self.heartbeat = parse_positive_seconds(key, value)?;
            }
            "rrarows" => {
                let rows = parse_seconds(key, value)?;
                if rows == 0 || rows > u32::MAX as u64 {
                    return Err(config_error(key, "must be greater than 0"));
                }
                self.rra_rows = rows as u32;
            }
            "rratimespan" => {
                for token in value.split([',', ' ', '\t']).filter(|t| !t.is_empty()) {
                    let span = parse_seconds(key, token)?;
                    // Zero-length timespans are silently skipped.
                    if span > 0 {
                        self.rra_timespans.push(span);
                    }
                }
            }
            "xff" => {
                let xff: f64 = value
                    .parse()
                    .map_err(|_| config_error(key, "must be a real number"))?;
                if !(0.0..1.0).contains(&xff) {
                    return Err(config_error(key, "must be in the range [0, 1)"));
                }
                self.xff = xff;
            }
            _ => return Err(RrdSinkError::UnknownConfigKey(key.to_string())),
        }
        Ok(())
    }

    /// Fill in interval-derived defaults and apply the coupling rules.
    ///
    /// `interval` is the collector's global sample interval in seconds. It
    /// seeds `StepSize` (1x) and `HeartBeat` (2x) when those were not set.
    pub fn finalize(&mut self, interval: u64) -> RrdSinkResult<()> {
        if self.step_size == 0 {
            self.step_size = interval;
        }
        if self.step_size == 0 {
            return Err(config_error("StepSize", "must be greater than 0"));
        }

        if self.heartbeat == 0 {
            self.heartbeat = 2 * interval;
        }
        if self.heartbeat == 0 {
            return Err(config_error("HeartBeat", "must be greater than 0"));
        }
        if self.heartbeat < interval {
            warn!(
                heartbeat = self.heartbeat,
                interval, "heartbeat is smaller than the collection interval"
            );
        }

        if self.rra_rows == 0 {
            self.rra_rows = DEFAULT_RRA_ROWS;
        }
        if self.rra_timespans.is_empty() {
            self.rra_timespans = DEFAULT_RRA_TIMESPANS.to_vec();
        }

        // Timeouts under 2 seconds disable the cache entirely.
        if self.cache_timeout < 2 {
            self.cache_timeout = 0;
            self.cache_flush_timeout = 0;
        } else if self.cache_flush_timeout < self.cache_timeout {
            self.cache_flush_timeout = 10 * self.cache_timeout;
        }

        Ok(())
    }
}

fn parse_seconds(key: &str, value: &str) -> RrdSinkResult<u64> {
    value
        .parse::<u64>()
        .map_err(|_| config_error(key, "must be a non-negative number of seconds"))
}

fn parse_positive_seconds(key: &str, value: &str) -> RrdSinkResult<u64> {
    let parsed = parse_seconds(key, value)?;
    if parsed == 0 {
        return Err(config_error(key, "must be greater than 0"));
    }
    Ok(parsed)
}

fn config_error(key: &str, message: &str) -> RrdSinkError {
    RrdSinkError::Config {
        key: key.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_case_insensitive() {
        let mut config = Config::default();
        config.set("CACHETIMEOUT", "120").unwrap();
        config.set("CacheFlush", "900").unwrap();
        assert_eq!(config.cache_timeout, 120);
        assert_eq!(config.cache_flush_timeout, 900);
    }

    #[test]
    fn unknown_key_rejected() {
        let mut config = Config::default();
        let err = config.set("CacheTimeOutt", "10").unwrap_err();
        assert!(matches!(err, RrdSinkError::UnknownConfigKey(_)));
    }

    #[test]
    fn data_dir_strips_trailing_slashes() {
        let mut config = Config::default();
        config.set("DataDir", "/var/lib/collectd///").unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/collectd")));
    }

    #[test]
    fn data_dir_of_only_slashes_resets_to_unset() {
        let mut config = Config::default();
        config.set("DataDir", "/var/lib/collectd").unwrap();
        config.set("DataDir", "///").unwrap();
        assert_eq!(config.data_dir, None);
    }

    #[test]
    fn timespan_list_splits_on_comma_space_tab() {
        let mut config = Config::default();
        config.set("RRATimespan", "3600, 86400\t604800").unwrap();
        config.set("RRATimespan", "2678400").unwrap();
        assert_eq!(config.rra_timespans, vec![3600, 86400, 604800, 2678400]);
    }

    #[test]
    fn timespan_zero_values_skipped() {
        let mut config = Config::default();
        config.set("RRATimespan", "0 3600 0").unwrap();
        assert_eq!(config.rra_timespans, vec![3600]);
    }

    #[test]
    fn timespan_garbage_rejected() {
        let mut config = Config::default();
        assert!(config.set("RRATimespan", "3600 bogus").is_err());
    }

    #[test]
    fn xff_range_enforced() {
        let mut config = Config::default();
        assert!(config.set("XFF", "0.0").is_ok());
        assert!(config.set("XFF", "0.9").is_ok());
        assert!(config.set("XFF", "1.0").is_err());
        assert!(config.set("XFF", "-0.1").is_err());
        assert!(config.set("XFF", "NaN").is_err());
    }

    #[test]
    fn step_size_and_heartbeat_must_be_positive() {
        let mut config = Config::default();
        assert!(config.set("StepSize", "0").is_err());
        assert!(config.set("HeartBeat", "0").is_err());
        assert!(config.set("StepSize", "10").is_ok());
    }

    #[test]
    fn finalize_defaults_from_interval() {
        let mut config = Config::default();
        config.finalize(10).unwrap();
        assert_eq!(config.step_size, 10);
        assert_eq!(config.heartbeat, 20);
        assert_eq!(config.rra_rows, DEFAULT_RRA_ROWS);
        assert_eq!(config.rra_timespans, DEFAULT_RRA_TIMESPANS);
    }

    #[test]
    fn finalize_without_interval_or_step_fails() {
        let mut config = Config::default();
        assert!(config.finalize(0).is_err());
    }

    #[test]
    fn small_cache_timeout_disables_caching() {
        let mut config = Config::default();
        config.set("CacheTimeout", "1").unwrap();
        config.set("CacheFlush", "500").unwrap();
        config.finalize(10).unwrap();
        assert_eq!(config.cache_timeout, 0);
        assert_eq!(config.cache_flush_timeout, 0);
    }

    #[test]
    fn cache_flush_defaults_to_ten_times_timeout() {
        let mut config = Config::default();
        config.set("CacheTimeout", "120").unwrap();
        config.finalize(10).unwrap();
        assert_eq!(config.cache_flush_timeout, 1200);

        let mut config = Config::default();
        config.set("CacheTimeout", "120").unwrap();
        config.set("CacheFlush", "60").unwrap();
        config.finalize(10).unwrap();
        assert_eq!(config.cache_flush_timeout, 1200);

        let mut config = Config::default();
        config.set("CacheTimeout", "120").unwrap();
        config.set("CacheFlush", "3600").unwrap();
        config.finalize(10).unwrap();
        assert_eq!(config.cache_flush_timeout, 3600);
    }
}
