use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{crate_version, value_parser, Arg, ArgMatches, Command};

use gpfs_exporter::config::{self, Config};

#[derive(Debug)]
pub struct Arguments {
    pub filesystem: String,
    pub pool: String,
    pub bin_dir: PathBuf,
}

impl Arguments {
    pub fn config(&self) -> Config {
        Config::new(&self.bin_dir, config::DEFAULT_TIMEOUT, vec![])
    }
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(args: ArgMatches) -> Result<Self, Self::Error> {
        let filesystem = args
            .get_one::<String>("filesystem")
            .with_context(|| "no filesystem argument")?
            .clone();

        let pool = args
            .get_one::<String>("pool")
            .with_context(|| "no pool argument")?
            .clone();

        let bin_dir = args
            .get_one::<PathBuf>("bin-dir")
            .with_context(|| "no bin-dir argument")?
            .clone();

        Ok(Self {
            filesystem,
            pool,
            bin_dir,
        })
    }
}

pub fn args() -> Result<Arguments> {
    let arguments = build().get_matches();
    let arguments = Arguments::try_from(arguments)?;
    Ok(arguments)
}

pub fn build() -> Command<'static> {
    let fs = Arg::new("filesystem")
        .takes_value(true)
        .required(true)
        .help("file system");

    let pool = Arg::new("pool")
        .takes_value(true)
        .required(true)
        .help("pool name");

    let bin_dir = Arg::new("bin-dir")
        .long("bin-dir")
        .takes_value(true)
        .value_name("DIR")
        .value_parser(value_parser!(PathBuf))
        .default_value(config::DEFAULT_BIN_DIR)
        .help("GPFS command directory");

    Command::new("gpfs-pool-percent")
        .about("show pool used in percent")
        .version(crate_version!())
        .arg(fs)
        .arg(pool)
        .arg(bin_dir)
        .mut_arg("help", |a| {
            a.short('?').help("print help").long_help("Print help.")
        })
        .mut_arg("version", |a| {
            a.hide_short_help(true).long_help("Print version.")
        })
}
