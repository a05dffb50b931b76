//! Metric names, descriptions and types.
//!
//! The tables below are the only place metric names are defined. Their order
//! is the order metrics appear in the exposition.

use crate::normalize::{grace, scale};
use crate::pool::PoolRecord;
use crate::quota::QuotaRecord;

const KB: u64 = 1024;

/// Prometheus metric type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Counter,
    Gauge,
}

impl Kind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
        }
    }
}

/// How a raw field value becomes a metric value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conversion {
    /// Emitted as is.
    Raw,

    /// Multiplied, e.g. by 1024 for kilobyte fields.
    Scale(u64),

    /// Grace state encoding, see [`grace`].
    Grace,
}

impl Conversion {
    /// Converts a numeric field value.
    #[must_use]
    pub const fn number(self, value: u64) -> u64 {
        match self {
            Self::Scale(multiplier) => scale(value, multiplier),
            Self::Raw | Self::Grace => value,
        }
    }

    /// Converts a textual field value, `None` if it is not a number and
    /// not a grace state.
    #[must_use]
    pub fn text(self, value: &str) -> Option<u64> {
        match self {
            Self::Grace => Some(grace(value)),
            Self::Raw | Self::Scale(_) => {
                value.parse().ok().map(|value| self.number(value))
            }
        }
    }
}

/// A metric and the raw field it is built from.
#[derive(Clone, Copy, Debug)]
pub struct MetricDefinition<F: 'static> {
    pub field: F,
    pub name: &'static str,
    pub help: &'static str,
    pub kind: Kind,
    pub conversion: Conversion,
}

const fn counter(
    field: &'static str,
    name: &'static str,
    help: &'static str,
) -> MetricDefinition<&'static str> {
    MetricDefinition {
        field,
        name,
        help,
        kind: Kind::Counter,
        conversion: Conversion::Raw,
    }
}

const fn gauge<F>(
    field: F,
    name: &'static str,
    help: &'static str,
    conversion: Conversion,
) -> MetricDefinition<F> {
    MetricDefinition {
        field,
        name,
        help,
        kind: Kind::Gauge,
        conversion,
    }
}

/// `mmpmon` `fs_io_s` counters by tag.
pub static IOSTAT: [MetricDefinition<&str>; 8] = [
    counter("_br_", "gpfs_bytes_read", "GPFS bytes read"),
    counter("_bw_", "gpfs_bytes_write", "GPFS bytes written"),
    counter(
        "_oc_",
        "gpfs_requests_open",
        "GPFS open call requests including create",
    ),
    counter("_cc_", "gpfs_requests_close", "GPFS close call requests"),
    counter("_rdc_", "gpfs_requests_read", "GPFS number of read requests"),
    counter("_wc_", "gpfs_requests_write", "GPFS number of write requests"),
    counter(
        "_dir_",
        "gpfs_requests_readdir",
        "GPFS number of readdir requests",
    ),
    counter(
        "_iu_",
        "gpfs_inode_updates",
        "GPFS number of inode updates to disk",
    ),
];

/// `mmlspool` capacity columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolField {
    TotalData,
    FreeData,
    TotalMeta,
    FreeMeta,
}

impl PoolField {
    /// Returns the raw kilobyte value.
    #[must_use]
    pub const fn raw(self, pool: &PoolRecord) -> u64 {
        match self {
            Self::TotalData => pool.data_columns().total_kb(),
            Self::FreeData => pool.data_columns().free_kb(),
            Self::TotalMeta => pool.meta_columns().total_kb(),
            Self::FreeMeta => pool.meta_columns().free_kb(),
        }
    }
}

/// `mmlspool` capacity gauges.
pub static POOL: [MetricDefinition<PoolField>; 4] = [
    gauge(
        PoolField::TotalData,
        "gpfs_pool_total_data_bytes",
        "GPFS pool total data size in bytes",
        Conversion::Scale(KB),
    ),
    gauge(
        PoolField::FreeData,
        "gpfs_pool_free_data_bytes",
        "GPFS pool free data size in bytes",
        Conversion::Scale(KB),
    ),
    gauge(
        PoolField::TotalMeta,
        "gpfs_pool_total_meta_bytes",
        "GPFS pool total metadata size in bytes",
        Conversion::Scale(KB),
    ),
    gauge(
        PoolField::FreeMeta,
        "gpfs_pool_free_meta_bytes",
        "GPFS pool free metadata size in bytes",
        Conversion::Scale(KB),
    ),
];

impl MetricDefinition<PoolField> {
    /// Returns the metric value of `pool`.
    #[must_use]
    pub const fn value(&self, pool: &PoolRecord) -> u64 {
        self.conversion.number(self.field.raw(pool))
    }
}

/// `mmrepquota` usage columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuotaField {
    BlockUsage,
    BlockSoftLimit,
    BlockHardLimit,
    BlockInDoubt,
    BlockGrace,
    FilesUsage,
    FilesSoftLimit,
    FilesHardLimit,
    FilesInDoubt,
    FilesGrace,
}

/// A raw quota field value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawValue<'a> {
    Number(u64),
    Text(&'a str),
}

impl QuotaField {
    /// Returns the raw value.
    #[must_use]
    pub fn raw(self, quota: &QuotaRecord) -> RawValue<'_> {
        let blocks = quota.blocks();
        let files = quota.files();

        match self {
            Self::BlockUsage => RawValue::Number(blocks.usage),
            Self::BlockSoftLimit => RawValue::Number(blocks.soft_limit),
            Self::BlockHardLimit => RawValue::Number(blocks.hard_limit),
            Self::BlockInDoubt => RawValue::Number(blocks.in_doubt),
            Self::BlockGrace => RawValue::Text(&blocks.grace),
            Self::FilesUsage => RawValue::Number(files.usage),
            Self::FilesSoftLimit => RawValue::Number(files.soft_limit),
            Self::FilesHardLimit => RawValue::Number(files.hard_limit),
            Self::FilesInDoubt => RawValue::Number(files.in_doubt),
            Self::FilesGrace => RawValue::Text(&files.grace),
        }
    }
}

/// `mmrepquota` usage gauges.
pub static QUOTA: [MetricDefinition<QuotaField>; 10] = [
    gauge(
        QuotaField::BlockUsage,
        "gpfs_quota_block_usage_bytes",
        "GPFS quota block usage in bytes",
        Conversion::Scale(KB),
    ),
    gauge(
        QuotaField::BlockSoftLimit,
        "gpfs_quota_block_soft_limit_bytes",
        "GPFS quota block soft limit in bytes",
        Conversion::Scale(KB),
    ),
    gauge(
        QuotaField::BlockHardLimit,
        "gpfs_quota_block_hard_limit_bytes",
        "GPFS quota block hard limit in bytes",
        Conversion::Scale(KB),
    ),
    gauge(
        QuotaField::BlockInDoubt,
        "gpfs_quota_block_in_doubt_bytes",
        "GPFS quota block usage in doubt in bytes",
        Conversion::Scale(KB),
    ),
    gauge(
        QuotaField::BlockGrace,
        "gpfs_quota_block_grace",
        "GPFS quota block grace state, 0 none, 1 expired, otherwise seconds plus one",
        Conversion::Grace,
    ),
    gauge(
        QuotaField::FilesUsage,
        "gpfs_quota_files_usage",
        "GPFS quota number of files",
        Conversion::Scale(1),
    ),
    gauge(
        QuotaField::FilesSoftLimit,
        "gpfs_quota_files_soft_limit",
        "GPFS quota files soft limit",
        Conversion::Scale(1),
    ),
    gauge(
        QuotaField::FilesHardLimit,
        "gpfs_quota_files_hard_limit",
        "GPFS quota files hard limit",
        Conversion::Scale(1),
    ),
    gauge(
        QuotaField::FilesInDoubt,
        "gpfs_quota_files_in_doubt",
        "GPFS quota number of files in doubt",
        Conversion::Scale(1),
    ),
    gauge(
        QuotaField::FilesGrace,
        "gpfs_quota_files_grace",
        "GPFS quota files grace state, 0 none, 1 expired, otherwise seconds plus one",
        Conversion::Grace,
    ),
];

impl MetricDefinition<QuotaField> {
    /// Returns the metric value of `quota`.
    #[must_use]
    pub fn value(&self, quota: &QuotaRecord) -> u64 {
        match self.field.raw(quota) {
            RawValue::Number(value) => self.conversion.number(value),
            RawValue::Text(value) => self.conversion.text(value).unwrap_or(1),
        }
    }
}
