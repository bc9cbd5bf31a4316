//! Error types for the rrdsink write path.
//!
//! All public APIs return `RrdSinkResult<T>` — no panics in library code.

use thiserror::Error;

/// Unified error type for all rrdsink operations.
#[derive(Debug, Error)]
pub enum RrdSinkError {
    /// Configuration key is not recognized
    #[error("unknown config key '{0}'")]
    UnknownConfigKey(String),

    /// Configuration value is out of range or unparseable
    #[error("invalid value for config key '{key}': {message}")]
    Config { key: String, message: String },

    /// Sample timestamp is not newer than the last accepted one for this file
    #[error("non-monotonic sample for '{file}': {value_time} is not newer than {last}")]
    NonMonotonic {
        file: String,
        value_time: u64,
        last: u64,
    },

    /// Derived archive path does not fit the fixed path buffer
    #[error("archive path '{path}' exceeds the {limit}-byte limit")]
    PathTooLong { path: String, limit: usize },

    /// Data source kind string is neither counter nor gauge
    #[error("unknown data source kind '{0}'")]
    UnknownDataSourceKind(String),

    /// Archive layout cannot be planned (bad step size, rows, or empty layout)
    #[error("archive layout error: {0}")]
    Layout(String),

    /// The RRA engine rejected a create or update invocation
    #[error("rrd engine error: {0}")]
    Engine(String),

    /// Enqueue refused because the flush queue has been shut down
    #[error("flush queue is shut down")]
    QueueClosed,

    /// Sample carries a different number of values than the schema has data sources
    #[error("value count mismatch: schema has {expected} data sources, sample has {actual} values")]
    ValueCountMismatch { expected: usize, actual: usize },

    /// Targeted flush named a file with no cache entry
    #[error("no cache entry for '{0}'")]
    NotCached(String),

    /// Write issued before init or after shutdown
    #[error("sink is not initialized")]
    NotInitialized,

    /// Standard I/O error
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Result type alias for all rrdsink operations.
pub type RrdSinkResult<T> = Result<T, RrdSinkError>;
