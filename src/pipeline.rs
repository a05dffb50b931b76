//! One collection cycle: run the commands, parse, correlate, render.

use std::fmt;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, warn};

use crate::command;
use crate::config::Config;
use crate::correlate::{correlate, Quota};
use crate::fileset::Filesets;
use crate::iostat::{self, IoStats};
use crate::pool::{parse_mmlspool_output, PoolRecord};
use crate::quota::parse_mmrepquota_output;
use crate::render::to_prom;

/// Source of the raw command output.
pub trait Backend {
    /// Returns the `mmpmon` `fs_io_s` output.
    ///
    /// # Errors
    ///
    /// Returns an error if the output can not be obtained.
    fn iostat(&self) -> Result<String>;

    /// Returns the `mmlspool` output of file system `fs`.
    ///
    /// # Errors
    ///
    /// Returns an error if the output can not be obtained.
    fn pools(&self, fs: &str) -> Result<String>;

    /// Returns the `mmlsfileset -Y` output of file system `fs`.
    ///
    /// # Errors
    ///
    /// Returns an error if the output can not be obtained.
    fn filesets(&self, fs: &str) -> Result<String>;

    /// Returns the `mmrepquota -Y` output of file system `fs`.
    ///
    /// # Errors
    ///
    /// Returns an error if the output can not be obtained.
    fn quotas(&self, fs: &str) -> Result<String>;
}

/// Runs the GPFS administrative commands.
#[derive(Clone, Debug, Default)]
pub struct Commands {
    config: Config,
}

impl Commands {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    fn command(&self, name: &str) -> Command {
        Command::new(self.config.command(name))
    }

    fn run(&self, cmd: Command, input: Option<&str>) -> Result<String> {
        command::run(cmd, input, self.config.timeout())
    }
}

impl Backend for Commands {
    fn iostat(&self) -> Result<String> {
        let mut cmd = self.command("mmpmon");
        cmd.arg("-p");
        self.run(cmd, Some(iostat::INPUT))
    }

    fn pools(&self, fs: &str) -> Result<String> {
        let mut cmd = self.command("mmlspool");
        cmd.arg(fs);
        self.run(cmd, None)
    }

    fn filesets(&self, fs: &str) -> Result<String> {
        let mut cmd = self.command("mmlsfileset");
        cmd.arg(fs).arg("-Y");
        self.run(cmd, None)
    }

    fn quotas(&self, fs: &str) -> Result<String> {
        let mut cmd = self.command("mmrepquota");
        cmd.arg("-Y").arg(fs);
        self.run(cmd, None)
    }
}

/// The per file system collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    Pools,
    Filesets,
    Quotas,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pools => "mmlspool",
            Self::Filesets => "mmlsfileset",
            Self::Quotas => "mmrepquota",
        })
    }
}

/// A per file system collection that did not contribute.
#[derive(Debug)]
pub struct Failure {
    filesystem: String,
    source: Source,
    error: anyhow::Error,
}

impl Failure {
    /// Returns the file system name.
    #[must_use]
    pub fn filesystem(&self) -> &str {
        &self.filesystem
    }

    /// Returns which collection failed.
    #[must_use]
    pub const fn source(&self) -> Source {
        self.source
    }

    /// Returns the cause.
    #[must_use]
    pub const fn error(&self) -> &anyhow::Error {
        &self.error
    }
}

/// The records of one collection cycle.
#[derive(Debug, Default)]
pub struct Collection {
    stats: IoStats,
    pools: Vec<PoolRecord>,
    quotas: Vec<Quota>,
    failures: Vec<Failure>,
}

impl Collection {
    /// Returns the I/O statistics.
    #[must_use]
    pub const fn stats(&self) -> &IoStats {
        &self.stats
    }

    /// Returns the pools of all candidate file systems.
    #[must_use]
    pub fn pools(&self) -> &[PoolRecord] {
        &self.pools
    }

    /// Returns the quota entries of all candidate file systems.
    #[must_use]
    pub fn quotas(&self) -> &[Quota] {
        &self.quotas
    }

    /// Returns the collections that did not contribute.
    #[must_use]
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Converts the records to prometheus metric format.
    ///
    /// # Errors
    ///
    /// See [`to_prom`].
    pub fn render(&self) -> Result<String> {
        to_prom(&self.stats, &self.pools, &self.quotas)
    }

    fn fail(&mut self, fs: &str, source: Source, error: anyhow::Error) {
        warn!(
            fs,
            %source,
            error = %format_args!("{error:#}"),
            "skipping file system"
        );

        self.failures.push(Failure {
            filesystem: fs.into(),
            source,
            error,
        });
    }
}

/// Returns the file systems that may be queried locally, sorted.
#[must_use]
pub fn candidates<'a>(stats: &'a IoStats, config: &Config) -> Vec<&'a str> {
    stats
        .filesystems()
        .into_iter()
        .filter(|fs| config.is_candidate(fs))
        .collect()
}

/// Runs one collection cycle.
///
/// # Errors
///
/// Returns an error only if the I/O statistics can not be obtained. Failing
/// per file system collections are recorded in [`Collection::failures`].
pub fn collect<B>(backend: &B, config: &Config) -> Result<Collection>
where
    B: Backend + ?Sized,
{
    let output = backend
        .iostat()
        .context("collecting I/O statistics")?;

    let mut collection = Collection {
        stats: IoStats::parse(&output),
        ..Collection::default()
    };

    let candidates = candidates(&collection.stats, config)
        .into_iter()
        .map(ToOwned::to_owned)
        .collect::<Vec<_>>();

    debug!(?candidates, "collecting file systems");

    let mut filesets = Filesets::default();
    let mut quotas = Vec::new();

    for fs in &candidates {
        let pools = backend
            .pools(fs)
            .and_then(|output| require_pools(fs, &output));

        match pools {
            Ok(pools) => collection.pools.extend(pools),
            Err(error) => collection.fail(fs, Source::Pools, error),
        }

        match backend.filesets(fs) {
            Ok(output) => filesets.extend(Filesets::parse(&output)),
            Err(error) => collection.fail(fs, Source::Filesets, error),
        }

        match backend.quotas(fs) {
            Ok(output) => quotas.extend(parse_mmrepquota_output(&output)),
            Err(error) => collection.fail(fs, Source::Quotas, error),
        }
    }

    collection.quotas = correlate(quotas, &filesets);

    info!(
        records = collection.stats.len(),
        filesystems = candidates.len(),
        pools = collection.pools.len(),
        filesets = filesets.len(),
        quotas = collection.quotas.len(),
        failures = collection.failures.len(),
        "collected"
    );

    Ok(collection)
}

fn require_pools(fs: &str, output: &str) -> Result<Vec<PoolRecord>> {
    let pools = parse_mmlspool_output(fs, output);

    if pools.is_empty() {
        Err(anyhow!("no pools in mmlspool output"))
    } else {
        Ok(pools)
    }
}

/// Runs one collection cycle and returns the prometheus metrics.
///
/// # Errors
///
/// Returns an error if the I/O statistics can not be obtained.
pub fn scrape<B>(backend: &B, config: &Config) -> Result<String>
where
    B: Backend + ?Sized,
{
    collect(backend, config)?.render()
}
