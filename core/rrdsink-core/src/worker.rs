//! Flush worker — the single background thread applying queued batches.
//!
//! The worker owns all engine I/O. It pops a filename from the flush queue,
//! performs the handoff under the cache lock, then invokes the engine
//! update with both locks released. Engine failures are logged and the
//! batch is discarded; the queue keeps draining. When the queue reports
//! shutdown the worker tears the cache down and exits.

use crate::cache::WriteCache;
use crate::engine::RraEngine;
use crate::queue::FlushQueue;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, warn};

/// Spawn the flush worker thread.
///
/// Exactly one worker per cache/queue pair; a second one would break the
/// single-reader ordering guarantee.
pub fn spawn(
    cache: Arc<WriteCache>,
    queue: Arc<FlushQueue>,
    engine: Arc<dyn RraEngine>,
) -> JoinHandle<()> {
    std::thread::spawn(move || run(cache, queue, engine))
}

fn run(cache: Arc<WriteCache>, queue: Arc<FlushQueue>, engine: Arc<dyn RraEngine>) {
    while let Some(path) = queue.pop() {
        // Handoff under the cache lock: the batch is ours afterwards, the
        // entry is back to idle and may start accumulating again.
        let Some(values) = cache.take_batch(&path) else {
            warn!(file = %path, "queued file vanished from the cache");
            continue;
        };
        if values.is_empty() {
            debug!(file = %path, "queued file had nothing left to flush");
            continue;
        }

        let mut argv = Vec::with_capacity(2 + values.len());
        argv.push("update".to_string());
        argv.push(path.clone());
        argv.extend(values);

        // Disk I/O happens here, outside both locks.
        if let Err(err) = engine.run(&argv) {
            error!(file = %path, %err, "rrd update failed; discarding batch");
        }
    }

    debug!("flush queue shut down; tearing down the cache");
    cache.clear();
}
