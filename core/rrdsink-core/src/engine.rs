//! RRA engine seam — how create and update argument vectors reach disk.
//!
//! The sink never manipulates archive files itself; it hands textual
//! argument vectors to an [`RraEngine`] implementation. Production use
//! shells out to the `rrdtool` binary; tests substitute recording engines.

use crate::error::{RrdSinkError, RrdSinkResult};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Executor for engine argument vectors.
///
/// `argv[0]` is the operation (`create` or `update`); the remaining
/// elements are exactly the strings specified by the archive layout planner
/// and the update-line formatter.
///
/// # Contract
///
/// - `run` blocks until the operation completes; callers must not hold the
///   cache or queue lock across it.
/// - A rejected operation returns [`RrdSinkError::Engine`] carrying the
///   engine's own error text.
pub trait RraEngine: Send + Sync {
    fn run(&self, argv: &[String]) -> RrdSinkResult<()>;
}

/// Engine implementation spawning the `rrdtool` command-line binary.
pub struct RrdtoolEngine {
    binary: PathBuf,
}

impl RrdtoolEngine {
    /// Use `rrdtool` from `$PATH`.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("rrdtool"),
        }
    }

    /// Use an explicit binary path.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for RrdtoolEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RraEngine for RrdtoolEngine {
    fn run(&self, argv: &[String]) -> RrdSinkResult<()> {
        debug!(binary = %self.binary.display(), ?argv, "invoking rrd engine");
        let output = Command::new(&self.binary).args(argv).output()?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(RrdSinkError::Engine(stderr.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_surfaces_io_error() {
        let engine = RrdtoolEngine::with_binary("/nonexistent/rrdtool-binary");
        let err = engine.run(&["create".to_string()]).unwrap_err();
        assert!(matches!(err, RrdSinkError::Io { .. }));
    }

    #[test]
    fn failing_command_surfaces_engine_error() {
        // `false` exits non-zero with empty stderr.
        let engine = RrdtoolEngine::with_binary("false");
        let err = engine.run(&["update".to_string()]).unwrap_err();
        assert!(matches!(err, RrdSinkError::Engine(_)));
    }

    #[test]
    fn succeeding_command_is_ok() {
        let engine = RrdtoolEngine::with_binary("true");
        assert!(engine.run(&["update".to_string()]).is_ok());
    }
}
