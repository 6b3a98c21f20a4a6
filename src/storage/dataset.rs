//! Record sets stored as a single JSON document.
//!
//! ```json
//! {
//!   "individuals": [{ "id": "I1" }, { "id": "I2" }, { "id": "I3" }],
//!   "families": [{ "id": "F1", "father": "I1", "mother": "I2", "children": ["I3"] }]
//! }
//! ```
//!
//! Fields the analyses do not use are ignored.

use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{Config, FamilyUnit, Individual};
use crate::{Analysis, AnalysisError};

/// Individuals and family units loaded from one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Every individual in the record set.
    #[serde(default)]
    pub individuals: Vec<Individual>,

    /// Every family unit in the record set.
    #[serde(default)]
    pub families: Vec<FamilyUnit>,
}

/// Errors that can occur when loading a record set.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file was not found.
    #[error("record set not found: {}", .0.display())]
    NotFound(PathBuf),

    /// An I/O error occurred.
    #[error("failed to read record set {}", .path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The JSON document could not be parsed.
    #[error("failed to parse record set {}", .path.display())]
    Json {
        /// The file being parsed.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },
}

impl Dataset {
    /// Loads a record set from the JSON file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NotFound`] if there is no file at `path`, or
    /// another [`LoadError`] if it cannot be read or parsed. Every variant
    /// carries `path`.
    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let dataset = Self::read(BufReader::new(file)).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            individuals = dataset.individuals.len(),
            families = dataset.families.len(),
            "record set loaded"
        );
        Ok(dataset)
    }

    /// Reads a record set from any JSON source.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid record set.
    pub fn read<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    /// Builds an [`Analysis`] over this record set.
    ///
    /// # Errors
    ///
    /// See [`Analysis::new`].
    pub fn analyse(&self, config: &Config) -> Result<Analysis, AnalysisError> {
        Analysis::new(&self.individuals, &self.families, config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::PersonId;

    const SIBLING_UNION: &str = r#"{
        "individuals": [
            {"id": "G1", "name": "Jean"},
            {"id": "G2"},
            {"id": "A"},
            {"id": "B"},
            {"id": "C"}
        ],
        "families": [
            {"id": "FG", "father": "G1", "mother": "G2", "children": ["A", "B"]},
            {"id": "FU", "father": "A", "mother": "B", "children": ["C"], "events": []}
        ]
    }"#;

    #[test]
    fn reads_records_and_ignores_extra_fields() {
        let dataset = Dataset::read(SIBLING_UNION.as_bytes()).unwrap();

        assert_eq!(dataset.individuals.len(), 5);
        assert_eq!(dataset.families.len(), 2);
        assert_eq!(dataset.families[0].children.len(), 2);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let dataset = Dataset::read("{}".as_bytes()).unwrap();

        assert_eq!(dataset, Dataset::default());
    }

    #[test]
    fn empty_id_is_rejected() {
        let result = Dataset::read(r#"{"individuals": [{"id": ""}]}"#.as_bytes());

        assert!(result.is_err());
    }

    #[test]
    fn parse_error_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"individuals\": 3}").unwrap();

        let error = Dataset::load(file.path()).unwrap_err();

        match &error {
            LoadError::Json { path, .. } => assert_eq!(path, file.path()),
            other => panic!("expected a parse error, got {other:?}"),
        }
        assert!(error.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn load_from_file_and_analyse() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SIBLING_UNION.as_bytes()).unwrap();

        let dataset = Dataset::load(file.path()).unwrap();
        let analysis = dataset.analyse(&Config::default()).unwrap();
        let coefficients = analysis.inbreeding_all().unwrap();

        assert_eq!(coefficients[&"C".parse::<PersonId>().unwrap()], 0.25);
        assert_eq!(analysis.components().len(), 1);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();

        let missing = tmp.path().join("missing.json");

        let result = Dataset::load(&missing);

        assert!(matches!(result, Err(LoadError::NotFound(path)) if path == missing));
    }
}
