use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::ReferencePolicy;

/// Configuration for pedigree analysis.
///
/// Controls how incomplete record sets are treated and how the batch
/// inbreeding pass is scheduled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// What to do with family units that reference individuals missing from
    /// the record set.
    ///
    /// Defaults to [`ReferencePolicy::Lenient`]: unknown ids are absorbed
    /// into the graph.
    pub dangling_references: ReferencePolicy,

    /// Whether to compute inbreeding coefficients one connected component per
    /// worker thread.
    ///
    /// Results are identical either way.
    pub parallel: bool,
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        dangling_references: ReferencePolicy,

        #[serde(default)]
        parallel: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                dangling_references,
                parallel,
            } => Self {
                dangling_references,
                parallel,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            dangling_references: config.dangling_references,
            parallel: config.parallel,
        }
    }
}
