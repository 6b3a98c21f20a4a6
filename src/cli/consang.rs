use std::{collections::BTreeMap, path::PathBuf};

use clap::Parser;
use pedigree::{Config, PersonId};
use tracing::instrument;

use super::{load_dataset, terminal::Colorize, OutputFormat};

#[derive(Debug, Parser)]
#[command(about = "Compute inbreeding coefficients for every individual")]
pub struct Consang {
    /// Path to the JSON record set
    dataset: PathBuf,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Compute without printing anything
    #[arg(long, short)]
    quiet: bool,

    /// Evaluate one connected component per worker thread
    #[arg(long)]
    parallel: bool,
}

impl Consang {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, mut config: Config) -> anyhow::Result<()> {
        config.parallel |= self.parallel;

        let dataset = load_dataset(&self.dataset)?;
        let coefficients = dataset.analyse(&config)?.inbreeding_all()?;

        if self.quiet {
            return Ok(());
        }

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&coefficients)?);
            }
            OutputFormat::Table => Self::output_table(&coefficients),
        }

        Ok(())
    }

    fn output_table(coefficients: &BTreeMap<PersonId, f64>) {
        eprintln!("{}", "Inbreeding coefficients:".dim());

        let mut inbred = 0usize;
        let mut max = 0.0_f64;
        for (id, f) in coefficients.iter().filter(|(_, f)| **f > 0.0) {
            println!("  {id}: F = {f:.6}");
            inbred += 1;
            max = max.max(*f);
        }

        if inbred == 0 {
            eprintln!("\n{}", "No inbreeding detected.".success());
        } else {
            eprintln!("\nInbred individuals: {inbred}/{}", coefficients.len());
            eprintln!("Maximum F: {max:.6}");
        }
    }
}
