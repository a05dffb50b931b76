use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};

use gpfs_exporter::config::{self, Config};

#[derive(Debug)]
pub struct Arguments {
    pub once: bool,
    pub address: IpAddr,
    pub port: u16,
    pub bin_dir: PathBuf,
    pub timeout: Duration,
    pub excludes: Vec<String>,
    pub verbose: bool,
    pub quiet: bool,
}

impl Arguments {
    pub const fn listen(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    pub fn config(&self) -> Config {
        Config::new(&self.bin_dir, self.timeout, self.excludes.clone())
    }
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(args: ArgMatches) -> Result<Self, Self::Error> {
        let once = args.get_one::<bool>("once").copied().unwrap_or_default();

        let address = *args
            .get_one::<IpAddr>("address")
            .with_context(|| "no address argument")?;

        let port = *args
            .get_one::<u16>("port")
            .with_context(|| "no port argument")?;

        let bin_dir = args
            .get_one::<PathBuf>("bin-dir")
            .with_context(|| "no bin-dir argument")?
            .clone();

        let timeout = args
            .get_one::<u64>("timeout")
            .map(|secs| Duration::from_secs(*secs))
            .with_context(|| "no timeout argument")?;

        let excludes = args.get_many::<String>("exclude").map_or_else(
            || {
                config::DEFAULT_EXCLUDES
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            },
            |values| values.cloned().collect(),
        );

        let verbose =
            args.get_one::<bool>("verbose").copied().unwrap_or_default();

        let quiet = args.get_one::<bool>("quiet").copied().unwrap_or_default();

        Ok(Self {
            once,
            address,
            port,
            bin_dir,
            timeout,
            excludes,
            verbose,
            quiet,
        })
    }
}

pub fn args() -> Result<Arguments> {
    let arguments = build().get_matches();
    let arguments = Arguments::try_from(arguments)?;
    Ok(arguments)
}

pub fn build() -> Command<'static> {
    let once = Arg::new("once")
        .short('p')
        .long("prometheus")
        .action(ArgAction::SetTrue)
        .help("print metrics once and exit")
        .long_help(
            "Collect once and print the metrics to STDOUT instead of serving \
             them via HTTP.",
        );

    let address = Arg::new("address")
        .short('A')
        .long("address")
        .takes_value(true)
        .value_name("IP")
        .value_parser(value_parser!(IpAddr))
        .default_value("0.0.0.0")
        .help("listen address");

    let port = Arg::new("port")
        .short('P')
        .long("port")
        .takes_value(true)
        .value_name("PORT")
        .value_parser(value_parser!(u16))
        .default_value("9001")
        .help("listen port");

    let bin_dir = Arg::new("bin-dir")
        .long("bin-dir")
        .takes_value(true)
        .value_name("DIR")
        .value_parser(value_parser!(PathBuf))
        .default_value(config::DEFAULT_BIN_DIR)
        .help("GPFS command directory")
        .long_help("Directory containing mmpmon, mmlspool etc.");

    let timeout = Arg::new("timeout")
        .long("timeout")
        .takes_value(true)
        .value_name("SECONDS")
        .value_parser(value_parser!(u64))
        .default_value("30")
        .help("per command timeout");

    let exclude = Arg::new("exclude")
        .long("exclude")
        .takes_value(true)
        .value_name("SUBSTRING")
        .action(ArgAction::Append)
        .help("skip matching file systems")
        .long_help(
            "Skip pool, fileset and quota collection for file systems whose \
             name contains SUBSTRING. May be given multiple times. Defaults \
             to ':' and 'remote'.",
        );

    let verbose = Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue)
        .help("debug logging");

    let quiet = Arg::new("quiet")
        .short('q')
        .long("quiet")
        .action(ArgAction::SetTrue)
        .conflicts_with("verbose")
        .help("only log errors");

    Command::new("gpfs-exporter")
        .about("GPFS metrics for prometheus")
        .version(crate_version!())
        .arg(once)
        .arg(address)
        .arg(port)
        .arg(bin_dir)
        .arg(timeout)
        .arg(exclude)
        .arg(verbose)
        .arg(quiet)
        .mut_arg("help", |a| {
            a.short('?').help("print help").long_help("Print help.")
        })
        .mut_arg("version", |a| {
            a.hide_short_help(true).long_help("Print version.")
        })
}
