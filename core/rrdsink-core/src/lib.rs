//! # rrdsink — write-coalescing cache for round-robin archive files
//!
//! rrdsink sits between a metrics collector and an RRA engine. Plugin read
//! loops hand it numeric samples at a fixed cadence; it batches them per
//! destination file, creates archive files on first use, and defers the
//! expensive engine updates onto a single background worker.
//!
//! ## Architecture
//!
//! ```text
//! write(sample)
//!   → path derivation → existence probe → (planner → engine create, first use)
//!   → coalescing cache insert → (timeout spanned?) → flush queue
//!                                                      ↓
//!                                      flush worker: handoff → engine update
//! ```
//!
//! Two locks serialize everything: the cache lock (entries and their
//! pending batches) and the queue lock (the FIFO of files with a batch
//! ready). The cache lock is always taken before the queue lock. All
//! engine I/O runs on the worker thread with both locks released.
//!
//! ## Quick Start
//!
//! ```rust
//! use rrdsink_core::{RrdSink, RrdtoolEngine};
//! use std::sync::Arc;
//!
//! # fn main() -> rrdsink_core::RrdSinkResult<()> {
//! let mut sink = RrdSink::new(Arc::new(RrdtoolEngine::new()));
//! sink.configure("DataDir", "/var/lib/collectd")?;
//! sink.configure("CacheTimeout", "120")?;
//! // sink.init(10)?; starts the flush worker; write() accepts samples.
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//! - [`sink`] — host-callback surface ([`RrdSink`])
//! - [`cache`] — coalescing cache and batch handoff
//! - [`queue`] — flush queue (FIFO + wake-on-push)
//! - [`worker`] — background flush worker
//! - [`layout`] — archive layout planner (DS/RRA definitions)
//! - [`path`] — identity tuple → archive path
//! - [`engine`] — RRA engine seam
//! - [`config`] — host configuration intake

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod path;
pub mod queue;
pub mod sample;
pub mod sink;
pub mod worker;

// Logging utilities
pub mod logging;


// Re-export commonly used types
pub use cache::{BatchStats, WriteCache};
pub use config::Config;
pub use engine::{RraEngine, RrdtoolEngine};
pub use error::{RrdSinkError, RrdSinkResult};
pub use queue::FlushQueue;
pub use sample::{DataSource, DataSourceKind, Identity, Value};
pub use sink::RrdSink;
