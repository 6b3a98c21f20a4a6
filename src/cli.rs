use std::path::{Path, PathBuf};

mod connex;
mod consang;
mod kinship;
mod terminal;

use clap::ArgAction;
use connex::Connex;
use consang::Consang;
use kinship::Kinship;
use pedigree::{Config, Dataset, ReferencePolicy};

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// How to treat family units that reference unknown individuals
    /// (overrides the configuration file)
    #[arg(long, global = true, value_name = "POLICY")]
    references: Option<References>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let mut config = match &self.config {
            Some(path) => Config::load(path).map_err(|e| anyhow::anyhow!("{e}"))?,
            None => Config::default(),
        };
        if let Some(references) = self.references {
            config.dangling_references = references.into();
        }

        self.command.run(config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Compute inbreeding coefficients
    ///
    /// Lists every individual whose parents are related, with their
    /// inbreeding coefficient F.
    Consang(Consang),

    /// Compute connected components
    ///
    /// Individuals are connected through spouse and parent/child links.
    Connex(Connex),

    /// Compute the kinship coefficient between two individuals
    Kinship(Kinship),
}

impl Command {
    fn run(self, config: Config) -> anyhow::Result<()> {
        match self {
            Self::Consang(command) => command.run(config)?,
            Self::Connex(command) => command.run(&config)?,
            Self::Kinship(command) => command.run(&config)?,
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum References {
    /// Absorb unknown ids into the graph
    Lenient,
    /// Fail on the first unknown id
    Strict,
    /// Ignore references to unknown ids
    Prune,
}

impl From<References> for ReferencePolicy {
    fn from(references: References) -> Self {
        match references {
            References::Lenient => Self::Lenient,
            References::Strict => Self::Strict,
            References::Prune => Self::Prune,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn load_dataset(path: &Path) -> anyhow::Result<Dataset> {
    Ok(Dataset::load(path)?)
}
