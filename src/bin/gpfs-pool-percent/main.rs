#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]

mod cli;

use anyhow::{Context, Result};

use gpfs_exporter::pool::parse_mmlspool_output;
use gpfs_exporter::{Backend, Commands};

fn main() -> Result<()> {
    let args = cli::args().with_context(|| "parsing CLI args")?;

    let output = Commands::new(args.config()).pools(&args.filesystem)?;

    let pools = parse_mmlspool_output(&args.filesystem, &output);

    let pool = pools
        .iter()
        .find(|pool| pool.name() == args.pool)
        .with_context(|| format!("pool {} not found", args.pool))?;

    let data_pool_size = pool
        .data()
        .with_context(|| format!("pool {} is not object data", args.pool))?;

    println!("{}", data_pool_size.used_percent());

    Ok(())
}
