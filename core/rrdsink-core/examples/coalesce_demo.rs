//! Minimal end-to-end run with a stdout engine instead of a real RRA
//! binary: configure, init, write a handful of samples, shut down.
//!
//! Run with `cargo run --example coalesce_demo`.

use rrdsink_core::{
    DataSource, DataSourceKind, Identity, RraEngine, RrdSink, RrdSinkResult, Value,
};
use std::sync::Arc;

struct StdoutEngine;

impl RraEngine for StdoutEngine {
    fn run(&self, argv: &[String]) -> RrdSinkResult<()> {
        if argv[0] == "create" {
            std::fs::write(&argv[1], b"")?;
        }
        println!("engine: {}", argv.join(" "));
        Ok(())
    }
}

fn main() -> RrdSinkResult<()> {
    rrdsink_core::logging::init("debug");

    let data_dir = std::env::temp_dir().join("rrdsink-demo");
    std::fs::create_dir_all(&data_dir)?;

    let mut sink = RrdSink::new(Arc::new(StdoutEngine));
    sink.configure("DataDir", &data_dir.to_string_lossy())?;
    sink.configure("CacheTimeout", "30")?;
    sink.init(10)?;

    let identity = Identity::new("demo", "load", "", "load", "shortterm");
    let schema = vec![DataSource::new("value", DataSourceKind::Gauge)];

    let t0 = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    for i in 0..5u64 {
        sink.write(&identity, &schema, &[Value::Gauge(0.5 + i as f64)], t0 + 10 * i)?;
    }

    // Force the pending batch out instead of waiting for the timeout.
    sink.flush(-1, None)?;
    sink.shutdown()?;
    Ok(())
}
