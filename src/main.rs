//! `pedigree`: inbreeding coefficients and connected components for a
//! genealogical record set.

use clap::Parser;

mod cli;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    Cli::parse().run()
}
