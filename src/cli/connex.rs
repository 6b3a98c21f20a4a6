use std::path::PathBuf;

use clap::Parser;
use pedigree::{domain::Component, Config, PersonId};
use tracing::instrument;

use super::{load_dataset, terminal::Colorize, OutputFormat};

/// Components larger than this are summarised rather than listed.
const LIST_LIMIT: usize = 20;

#[derive(Debug, Parser)]
#[command(about = "Compute the connected components of the relationship graph")]
pub struct Connex {
    /// Path to the JSON record set
    dataset: PathBuf,

    /// Show every component rather than only the largest
    #[arg(long, short)]
    all: bool,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

impl Connex {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let dataset = load_dataset(&self.dataset)?;
        let components = dataset.analyse(config)?.components();

        match self.output {
            OutputFormat::Json => self.output_json(&components)?,
            OutputFormat::Table => self.output_table(&components),
        }

        Ok(())
    }

    fn output_json(&self, components: &[Component]) -> anyhow::Result<()> {
        use serde_json::json;

        let output = if self.all {
            json!({
                "components": components,
                "count": components.len(),
            })
        } else {
            let largest = components.first().cloned().unwrap_or_default();
            json!({
                "size": largest.len(),
                "largest_component": largest,
                "total_components": components.len(),
            })
        };

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_table(&self, components: &[Component]) {
        eprintln!("Connected components: {}", components.len());

        if self.all {
            for (index, component) in components.iter().enumerate() {
                eprintln!(
                    "\n{}",
                    format!("Component {} ({} individuals):", index + 1, component.len()).dim()
                );
                println!("  {}", join(component));
            }
            return;
        }

        let Some(largest) = components.first() else {
            return;
        };
        eprintln!(
            "Largest component: {}",
            format!("{} individuals", largest.len()).success()
        );
        if largest.len() <= LIST_LIMIT {
            println!("  {}", join(largest));
        }
    }
}

fn join(component: &[PersonId]) -> String {
    component
        .iter()
        .map(PersonId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
