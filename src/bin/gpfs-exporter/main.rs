#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]

mod cli;
mod server;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gpfs_exporter::Commands;

use cli::Arguments;

fn main() -> Result<()> {
    let args = cli::args().with_context(|| "parsing CLI args")?;

    init_logging(&args);

    let config = args.config();

    if args.once {
        let backend = Commands::new(config.clone());

        let prom = gpfs_exporter::scrape(&backend, &config)
            .with_context(|| "collecting metrics")?;

        print!("{prom}");

        return Ok(());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bin_dir = %config.bin_dir().display(),
        timeout = ?config.timeout(),
        excludes = ?config.excludes(),
        "starting"
    );

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .with_context(|| "building tokio runtime")?
        .block_on(server::serve(args.listen(), config))
}

/// Logs to **STDERR**, so metrics printed to **STDOUT** stay parseable.
fn init_logging(args: &Arguments) {
    let level = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gpfs_exporter={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
