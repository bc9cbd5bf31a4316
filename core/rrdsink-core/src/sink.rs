//! Host-callback surface — the value the metrics collector drives.
//!
//! [`RrdSink`] gathers configuration, cache, queue, engine, and the worker
//! handle into one owner. The host binds its lifecycle callbacks to the
//! methods here: `configure` during config parsing, `init` once, `write`
//! from its plugin read loops, `flush` on demand, `shutdown` last.

use crate::cache::WriteCache;
use crate::config::Config;
use crate::engine::RraEngine;
use crate::error::{RrdSinkError, RrdSinkResult};
use crate::layout;
use crate::path::archive_path;
use crate::queue::FlushQueue;
use crate::sample::{format_update_line, DataSource, Identity, Value};
use crate::worker;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info, warn};

/// Running state built by `init`: the cache, its queue, and the worker.
struct Runtime {
    cache: Arc<WriteCache>,
    queue: Arc<FlushQueue>,
    worker: JoinHandle<()>,
}

/// Write-coalescing sink for round-robin archive files.
pub struct RrdSink {
    config: Config,
    engine: Arc<dyn RraEngine>,
    runtime: Option<Runtime>,
}

impl RrdSink {
    /// Collect an engine implementation. No threads are started until
    /// [`RrdSink::init`].
    pub fn new(engine: Arc<dyn RraEngine>) -> Self {
        Self {
            config: Config::default(),
            engine,
            runtime: None,
        }
    }

    /// Accept one configuration pair from the host. See [`Config::set`].
    pub fn configure(&mut self, key: &str, value: &str) -> RrdSinkResult<()> {
        self.config.set(key, value)
    }

    /// Finalize configuration, build the cache, and start the flush worker.
    ///
    /// `interval` is the collector's global sample interval in seconds.
    pub fn init(&mut self, interval: u64) -> RrdSinkResult<()> {
        if self.runtime.is_some() {
            warn!("init called twice; keeping the running worker");
            return Ok(());
        }

        self.config.finalize(interval)?;

        let queue = Arc::new(FlushQueue::new());
        let cache = Arc::new(WriteCache::new(&self.config, Arc::clone(&queue)));
        let handle = worker::spawn(
            Arc::clone(&cache),
            Arc::clone(&queue),
            Arc::clone(&self.engine),
        );

        info!(
            cache_timeout = self.config.cache_timeout,
            cache_flush_timeout = self.config.cache_flush_timeout,
            step_size = self.config.step_size,
            "rrd sink initialized"
        );

        self.runtime = Some(Runtime {
            cache,
            queue,
            worker: handle,
        });
        Ok(())
    }

    /// Accept one sample: derive the archive path, create the file on first
    /// use, and insert the formatted update line into the cache.
    pub fn write(
        &self,
        identity: &Identity,
        schema: &[DataSource],
        values: &[Value],
        time: u64,
    ) -> RrdSinkResult<()> {
        let runtime = self.runtime.as_ref().ok_or(RrdSinkError::NotInitialized)?;

        if values.len() != schema.len() {
            return Err(RrdSinkError::ValueCountMismatch {
                expected: schema.len(),
                actual: values.len(),
            });
        }

        let path = match archive_path(self.config.data_dir.as_deref(), identity) {
            Ok(path) => path,
            Err(err) => {
                error!(
                    host = %identity.host,
                    plugin = %identity.plugin,
                    type_name = %identity.type_name,
                    %err,
                    "cannot derive archive path; rejecting write"
                );
                return Err(err);
            }
        };

        // Probe-and-create happens synchronously here, before the insert,
        // so the worker never races a producer for file creation.
        match std::fs::metadata(&path) {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.create_archive(&path, schema)?;
            }
            Err(err) => return Err(err.into()),
        }

        let line = format_update_line(values, time)?;
        runtime.cache.insert(&path, line, time)
    }

    /// Flush cached batches older than `timeout` seconds.
    ///
    /// With an identifier, only that file is considered; the identifier is
    /// the path fragment between the data directory and the `.rrd` suffix
    /// (`host/plugin[-instance]/type[-instance]`). A negative timeout
    /// flushes unconditionally.
    pub fn flush(&self, timeout: i64, identifier: Option<&str>) -> RrdSinkResult<()> {
        let runtime = self.runtime.as_ref().ok_or(RrdSinkError::NotInitialized)?;

        match identifier {
            None => {
                runtime.cache.flush(timeout);
                Ok(())
            }
            Some(identifier) => {
                let key = match &self.config.data_dir {
                    Some(dir) => format!("{}/{identifier}.rrd", dir.display()),
                    None => format!("{identifier}.rrd"),
                };
                runtime.cache.flush_identifier(&key, timeout)
            }
        }
    }

    /// Queue every pending batch, signal the worker, and wait for it to
    /// drain the queue and tear the cache down.
    ///
    /// Producers must stop calling [`RrdSink::write`] before shutdown; a
    /// write racing past it fails with [`RrdSinkError::NotInitialized`].
    pub fn shutdown(&mut self) -> RrdSinkResult<()> {
        let Some(runtime) = self.runtime.take() else {
            return Ok(());
        };

        runtime.cache.flush(-1);
        runtime.queue.shutdown();
        if runtime.worker.join().is_err() {
            error!("flush worker panicked during shutdown");
        }
        Ok(())
    }

    /// Finalized configuration (after `init`).
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn create_archive(&self, path: &str, schema: &[DataSource]) -> RrdSinkResult<()> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let args = match layout::create_args(path, &self.config, schema) {
            Ok(args) => args,
            Err(err) => {
                error!(file = %path, %err, "cannot plan archive layout; skipping create");
                return Err(err);
            }
        };
        if let Err(err) = self.engine.run(&args) {
            error!(file = %path, %err, "rrd create failed");
            return Err(err);
        }

        info!(file = %path, "created archive file");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn cache_handle(&self) -> Option<Arc<WriteCache>> {
        self.runtime.as_ref().map(|rt| Arc::clone(&rt.cache))
    }

    #[cfg(test)]
    pub(crate) fn queue_handle(&self) -> Option<Arc<FlushQueue>> {
        self.runtime.as_ref().map(|rt| Arc::clone(&rt.queue))
    }
}
