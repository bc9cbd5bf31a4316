//! Logging setup for hosts without their own subscriber.
//!
//! The cache and worker report through `tracing`: non-monotonic samples and
//! oversize paths as warnings/errors on the write path, engine create and
//! update failures from the worker thread. A collector embedding this crate
//! usually installs its own subscriber; [`init`] covers the ones that don't
//! by scoping the default filter to this crate.

/// Install a formatting subscriber filtered to `rrdsink_core=<level>`.
///
/// `RUST_LOG` overrides the filter when set. Events carry the archive file
/// path as a field, so targets add little; they are omitted.
#[cfg(feature = "logging")]
pub fn init(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rrdsink_core={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// No-op stub when the `logging` feature is disabled.
#[cfg(not(feature = "logging"))]
pub fn init(_level: &str) {}
