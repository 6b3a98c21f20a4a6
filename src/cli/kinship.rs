use std::path::PathBuf;

use clap::Parser;
use pedigree::{Config, PersonId};
use tracing::instrument;

use super::load_dataset;

#[derive(Debug, Parser)]
#[command(about = "Compute the kinship coefficient between two individuals")]
pub struct Kinship {
    /// Path to the JSON record set
    dataset: PathBuf,

    /// First individual
    first: PersonId,

    /// Second individual
    second: PersonId,
}

impl Kinship {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let dataset = load_dataset(&self.dataset)?;
        let analysis = dataset.analyse(config)?;

        let phi = analysis
            .kinship_engine()
            .kinship(&self.first, &self.second)?;
        println!("φ({}, {}) = {phi:.6}", self.first, self.second);

        Ok(())
    }
}
