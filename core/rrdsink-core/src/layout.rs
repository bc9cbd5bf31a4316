//! Archive layout planner — pure functions producing create-time arguments.
//!
//! Given a sample schema and the finalized configuration, the planner emits
//! the textual DS and RRA definitions the engine's create operation expects.
//! No I/O happens here; the flush path assembles and executes the result.

use crate::config::Config;
use crate::error::{RrdSinkError, RrdSinkResult};
use crate::sample::DataSource;

/// Aggregations emitted per retention timespan.
pub const RRA_AGGREGATIONS: &[&str] = &["AVERAGE", "MIN", "MAX"];

/// Data-source definitions, one per schema entry:
/// `DS:<name>:<COUNTER|GAUGE>:<heartbeat>:<min>:<max>`.
pub fn ds_definitions(schema: &[DataSource], heartbeat: u64) -> RrdSinkResult<Vec<String>> {
    if schema.is_empty() {
        return Err(RrdSinkError::Layout(
            "schema has no data sources".to_string(),
        ));
    }

    Ok(schema
        .iter()
        .map(|ds| {
            format!(
                "DS:{}:{}:{}:{}:{}",
                ds.name,
                ds.kind.as_str(),
                heartbeat,
                render_bound(ds.min),
                render_bound(ds.max),
            )
        })
        .collect())
}

/// Round-robin archive definitions: `RRA:<agg>:<xff>:<cdp_len>:<cdp_num>`.
///
/// Timespans too short to fill `rra_rows` primary points are skipped. The
/// first surviving timespan is archived at primary resolution (`cdp_len`
/// of 1); longer ones consolidate enough points to stay near `rra_rows`
/// archived rows.
pub fn rra_definitions(config: &Config) -> RrdSinkResult<Vec<String>> {
    let step = config.step_size;
    let rows = config.rra_rows as u64;
    if step == 0 {
        return Err(RrdSinkError::Layout(
            "step size must be greater than 0".to_string(),
        ));
    }
    if rows == 0 {
        return Err(RrdSinkError::Layout(
            "rra rows must be greater than 0".to_string(),
        ));
    }

    let mut definitions = Vec::with_capacity(config.rra_timespans.len() * RRA_AGGREGATIONS.len());
    let mut cdp_len: u64 = 0;

    for &span in &config.rra_timespans {
        if span / step < rows {
            continue;
        }

        cdp_len = if cdp_len == 0 { 1 } else { span / (rows * step) };
        let cdp_num = span.div_ceil(cdp_len * step);

        for aggregation in RRA_AGGREGATIONS {
            definitions.push(format!(
                "RRA:{}:{:3.1}:{}:{}",
                aggregation, config.xff, cdp_len, cdp_num
            ));
        }
    }

    Ok(definitions)
}

/// Full create argument vector:
/// `["create", <filename>, "-s", <step>, DS…, RRA…]`.
///
/// Fails when the configured timespans yield no archives at all; creating
/// such a file would be rejected by the engine with a far less useful
/// message.
pub fn create_args(
    filename: &str,
    config: &Config,
    schema: &[DataSource],
) -> RrdSinkResult<Vec<String>> {
    let ds = ds_definitions(schema, config.heartbeat)?;
    let rra = rra_definitions(config)?;
    if rra.is_empty() {
        return Err(RrdSinkError::Layout(format!(
            "no RRA definitions: every timespan holds fewer than {} primary points at step {}",
            config.rra_rows, config.step_size
        )));
    }

    let mut args = Vec::with_capacity(4 + ds.len() + rra.len());
    args.push("create".to_string());
    args.push(filename.to_string());
    args.push("-s".to_string());
    args.push(config.step_size.to_string());
    args.extend(ds);
    args.extend(rra);
    Ok(args)
}

fn render_bound(bound: Option<f64>) -> String {
    match bound {
        Some(value) if value.is_finite() => value.to_string(),
        _ => "U".to_string(),
    }
}
