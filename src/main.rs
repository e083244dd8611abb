//! # Sweeper command-line entry point
//!
//! ```bash
//! sweeper convert customers.csv orders.xlsx --to excel --remove-duplicates --impute-means
//! sweeper convert sales.xlsx --columns region,total --out-dir exports
//! sweeper inspect customers.csv
//! ```
//!
//! `convert` exits with an error only when no file could be converted.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Allow println! in main binary

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = cli::load_config(&cli)?;
    sweeper::logging::init(&config.log)?;

    cli::run_command(cli.command, &config)
}
