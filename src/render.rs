//! Prometheus text exposition.

use std::fmt::Write;

use anyhow::Result;
use tracing::trace;

use crate::catalog::{Kind, IOSTAT, POOL, QUOTA};
use crate::correlate::Quota;
use crate::iostat::IoStats;
use crate::pool::PoolRecord;

/// Writes the I/O counters, sorted by node and file system.
///
/// # Errors
///
/// This function uses [`writeln`] to write to `output`. It can only fail if
/// any of these [`writeln`] fails.
pub fn write_iostat_metrics<Output: Write>(
    stats: &IoStats,
    output: &mut Output,
) -> Result<()> {
    for metric in &IOSTAT {
        write_header(output, metric.name, metric.help, metric.kind)?;

        for record in stats.records() {
            let Some(value) = record.get(metric.field) else {
                continue;
            };

            if value.parse::<u64>().is_err() {
                trace!(value, metric = metric.name, "skipping non-numeric");
                continue;
            }

            write!(output, "{}", metric.name)?;
            write_labels(
                output,
                &[("fs", record.fs()), ("host", record.host())],
            )?;
            write!(output, " {value}")?;

            if let Some(timestamp) = record.timestamp_ms() {
                write!(output, " {timestamp}")?;
            }

            writeln!(output)?;
        }
    }

    Ok(())
}

/// Writes the pool capacities in the given order.
///
/// # Errors
///
/// This function uses [`writeln`] to write to `output`. It can only fail if
/// any of these [`writeln`] fails.
pub fn write_pool_metrics<Output: Write>(
    pools: &[PoolRecord],
    output: &mut Output,
) -> Result<()> {
    for metric in &POOL {
        write_header(output, metric.name, metric.help, metric.kind)?;

        for pool in pools {
            let id = pool.id().to_string();

            write!(output, "{}", metric.name)?;
            write_labels(
                output,
                &[
                    ("fs", pool.fs()),
                    ("pool", pool.name()),
                    ("pool_id", id.as_str()),
                    ("pool_type", pool.pool_type()),
                    ("block_size", pool.block_size()),
                ],
            )?;
            writeln!(output, " {}", metric.value(pool))?;
        }
    }

    Ok(())
}

/// Writes the quota usage in the given order.
///
/// # Errors
///
/// This function uses [`writeln`] to write to `output`. It can only fail if
/// any of these [`writeln`] fails.
pub fn write_quota_metrics<Output: Write>(
    quotas: &[Quota],
    output: &mut Output,
) -> Result<()> {
    for metric in &QUOTA {
        write_header(output, metric.name, metric.help, metric.kind)?;

        for quota in quotas {
            let record = quota.record();
            let quota_type = record.quota_type();

            write!(output, "{}", metric.name)?;
            write_labels(
                output,
                &[
                    ("fs", record.fs()),
                    ("type", quota_type.as_str()),
                    (quota_type.id_label(), record.id()),
                    ("name", record.name()),
                    ("fid", record.fid().unwrap_or_default()),
                    ("fileset", quota.fileset()),
                    ("quota", record.quota()),
                    ("def_quota", record.def_quota()),
                    ("remarks", record.remarks()),
                ],
            )?;
            writeln!(output, " {}", metric.value(record))?;
        }
    }

    Ok(())
}

/// Converts all records to prometheus metric format.
///
/// # Errors
///
/// This function uses [`writeln`] to write to the output [`String`] that is
/// returned. It can only fail if any of these [`writeln`] fails.
pub fn to_prom(
    stats: &IoStats,
    pools: &[PoolRecord],
    quotas: &[Quota],
) -> Result<String> {
    let mut output = String::default();

    write_iostat_metrics(stats, &mut output)?;
    write_pool_metrics(pools, &mut output)?;
    write_quota_metrics(quotas, &mut output)?;

    Ok(output)
}

fn write_header<Output: Write>(
    output: &mut Output,
    name: &str,
    help: &str,
    kind: Kind,
) -> Result<()> {
    writeln!(output, "# HELP {name} {help}")?;
    writeln!(output, "# TYPE {name} {}", kind.as_str())?;
    Ok(())
}

fn write_labels<Output: Write>(
    output: &mut Output,
    labels: &[(&str, &str)],
) -> Result<()> {
    output.write_char('{')?;

    for (i, (name, value)) in labels.iter().enumerate() {
        if i > 0 {
            output.write_str(", ")?;
        }

        write!(output, "{name}=\"")?;
        write_escaped(output, value)?;
        output.write_char('"')?;
    }

    output.write_char('}')?;

    Ok(())
}

fn write_escaped<Output: Write>(
    output: &mut Output,
    value: &str,
) -> Result<()> {
    for c in value.chars() {
        match c {
            '\\' => output.write_str(r"\\")?,
            '"' => output.write_str(r#"\""#)?,
            '\n' => output.write_str(r"\n")?,
            c => output.write_char(c)?,
        }
    }

    Ok(())
}
