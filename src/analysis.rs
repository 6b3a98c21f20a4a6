//! One record set, analysed.
//!
//! [`Analysis`] owns the relationship graph built from a record set and hands
//! out the inbreeding and connectivity results computed over it.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{
    Component, ComponentFinder, Config, CyclicAncestryError, DanglingReferenceError, FamilyUnit,
    Individual, KinshipEngine, PersonId, RelationshipGraph,
};

/// Errors raised while analysing a record set.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A family unit references an individual missing from the record set.
    #[error(transparent)]
    DanglingReference(#[from] DanglingReferenceError),

    /// An individual is recorded as their own ancestor.
    #[error(transparent)]
    CyclicAncestry(#[from] CyclicAncestryError),
}

/// Analyses over a single record set.
#[derive(Debug)]
pub struct Analysis {
    graph: RelationshipGraph,
    parallel: bool,
}

impl Analysis {
    /// Builds the relationship graph for `individuals` and `families`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::DanglingReference`] when the configuration
    /// asks for strict reference checking and a family unit references an
    /// unknown id.
    pub fn new(
        individuals: &[Individual],
        families: &[FamilyUnit],
        config: &Config,
    ) -> Result<Self, AnalysisError> {
        let graph = RelationshipGraph::build(individuals, families, config.dangling_references)?;
        Ok(Self {
            graph,
            parallel: config.parallel,
        })
    }

    /// A fresh kinship engine over this record set.
    #[must_use]
    pub fn kinship_engine(&self) -> KinshipEngine<'_> {
        KinshipEngine::new(&self.graph)
    }

    /// The inbreeding coefficient of every supplied individual.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::CyclicAncestry`] if any supplied individual
    /// descends from themselves. The error reported is the one met by the
    /// earliest individual in input order, whether or not the pass runs in
    /// parallel.
    #[instrument(skip(self), fields(parallel = self.parallel))]
    pub fn inbreeding_all(&self) -> Result<BTreeMap<PersonId, f64>, AnalysisError> {
        let coefficients = if self.parallel {
            self.inbreeding_by_component()?
        } else {
            let mut engine = self.kinship_engine();
            let coefficients = engine.inbreeding_all()?;
            debug!(pairs = engine.cached_pairs(), "kinship pairs memoised");
            coefficients
        };

        debug!(
            inbred = coefficients.values().filter(|f| **f > 0.0).count(),
            "inbreeding coefficients computed"
        );
        Ok(coefficients)
    }

    /// All connected components, largest first.
    #[must_use]
    pub fn components(&self) -> Vec<Component> {
        ComponentFinder::new(&self.graph).components()
    }

    /// The largest connected component, or an empty one for an empty record
    /// set.
    #[must_use]
    pub fn largest_component(&self) -> Component {
        ComponentFinder::new(&self.graph).largest_component()
    }

    /// Every kinship query stays within one component, so each component gets
    /// its own engine. Members keep their relative input order so that the
    /// memo tables fill exactly as they would in a single sequential pass.
    fn inbreeding_by_component(&self) -> Result<BTreeMap<PersonId, f64>, CyclicAncestryError> {
        let components = self.components();

        let membership: HashMap<&PersonId, usize> = components
            .iter()
            .enumerate()
            .flat_map(|(index, component)| component.iter().map(move |id| (id, index)))
            .collect();

        let mut batches: Vec<Vec<(usize, &PersonId)>> = vec![Vec::new(); components.len()];
        for (position, id) in self.graph.individuals().iter().enumerate() {
            if let Some(&index) = membership.get(id) {
                batches[index].push((position, id));
            }
        }

        // Each batch stops at its first failure, tagged with the input
        // position of the individual that hit it.
        let results: Vec<_> = batches
            .par_iter()
            .filter(|batch| !batch.is_empty())
            .map(|batch| {
                let mut engine = KinshipEngine::new(&self.graph);
                batch
                    .iter()
                    .map(|&(position, id)| {
                        engine
                            .inbreeding(id)
                            .map(|f| (id.clone(), f))
                            .map_err(|error| (position, error))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect();

        let mut coefficients = BTreeMap::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(batch) => coefficients.extend(batch),
                Err(failure) => failures.push(failure),
            }
        }

        failures
            .into_iter()
            .min_by_key(|(position, _)| *position)
            .map_or(Ok(coefficients), |(_, error)| Err(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReferencePolicy;

    fn id(s: &str) -> PersonId {
        s.parse().unwrap()
    }

    fn individuals(ids: &[&str]) -> Vec<Individual> {
        ids.iter().map(|s| Individual::new(id(s))).collect()
    }

    fn family(fid: &str, father: &str, mother: &str, children: &[&str]) -> FamilyUnit {
        children.iter().fold(
            FamilyUnit::new(fid)
                .with_father(id(father))
                .with_mother(id(mother)),
            |family, child| family.with_child(id(child)),
        )
    }

    /// Two unrelated clans: a sibling union and a cousin union, plus a parent
    /// who married their own child, plus a loner.
    fn records() -> (Vec<Individual>, Vec<FamilyUnit>) {
        let individuals = individuals(&[
            "X", "G1", "GPA", "G2", "A", "GMA", "B", "P1", "P1P", "P2", "P2P", "C", "A2", "B2",
            "LONER", "Q", "QW", "QD", "QC",
        ]);
        let families = vec![
            family("FG", "G1", "G2", &["A", "B"]),
            family("FU", "A", "B", &["C"]),
            family("FF", "GPA", "GMA", &["P1", "P2"]),
            family("FA", "P1", "P1P", &["A2"]),
            family("FB", "P2", "P2P", &["B2"]),
            family("FX", "A2", "B2", &["X"]),
            family("FQ", "Q", "QW", &["QD"]),
            family("FQD", "Q", "QD", &["QC"]),
        ];
        (individuals, families)
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let (individuals, families) = records();
        let sequential = Analysis::new(&individuals, &families, &Config::default())
            .unwrap()
            .inbreeding_all()
            .unwrap();
        let parallel = Analysis::new(
            &individuals,
            &families,
            &Config {
                parallel: true,
                ..Config::default()
            },
        )
        .unwrap()
        .inbreeding_all()
        .unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(sequential.len(), individuals.len());
        assert_eq!(sequential[&id("C")], 0.25);
        assert!((sequential[&id("X")] - 0.0625).abs() < 1e-9);
        assert!(sequential[&id("QC")] > 0.0);
    }

    #[test]
    fn components_cover_every_individual() {
        let (individuals, families) = records();
        let analysis = Analysis::new(&individuals, &families, &Config::default()).unwrap();

        let components = analysis.components();

        assert_eq!(components.len(), 4);
        assert_eq!(
            components.iter().map(Vec::len).sum::<usize>(),
            individuals.len()
        );
        assert_eq!(analysis.largest_component().len(), 9);
        assert_eq!(components.last().unwrap(), &vec![id("LONER")]);
    }

    #[test]
    fn empty_record_set() {
        let analysis = Analysis::new(&[], &[], &Config::default()).unwrap();

        assert!(analysis.inbreeding_all().unwrap().is_empty());
        assert!(analysis.components().is_empty());
        assert!(analysis.largest_component().is_empty());
    }

    #[test]
    fn strict_configuration_rejects_dangling_references() {
        let config = Config {
            dangling_references: ReferencePolicy::Strict,
            ..Config::default()
        };

        let err = Analysis::new(
            &individuals(&["C"]),
            &[family("F1", "GHOST", "SHADE", &["C"])],
            &config,
        )
        .unwrap_err();

        assert!(matches!(err, AnalysisError::DanglingReference(_)));
        assert_eq!(err.to_string(), "family F1 references unknown individual GHOST");
    }

    #[test]
    fn parallel_reports_the_earliest_cycle_in_input_order() {
        // Two cyclic clans; the second is larger, so it is the first
        // component.
        let individuals = individuals(&["A", "B", "M", "C", "D", "N", "E", "K"]);
        let families = vec![
            family("F1", "B", "M", &["A"]),
            family("F2", "A", "M", &["B"]),
            family("F3", "D", "N", &["C"]),
            family("F4", "C", "N", &["D"]),
            family("F5", "E", "N", &["K"]),
        ];

        for parallel in [false, true] {
            let config = Config {
                parallel,
                ..Config::default()
            };
            let analysis = Analysis::new(&individuals, &families, &config).unwrap();

            match analysis.inbreeding_all() {
                Err(AnalysisError::CyclicAncestry(error)) => {
                    assert_eq!(
                        error,
                        CyclicAncestryError {
                            first: id("B"),
                            second: id("M"),
                        },
                        "parallel = {parallel}"
                    );
                }
                other => panic!("expected a cycle, got {other:?}"),
            }
        }
    }

    #[test]
    fn cyclic_ancestry_surfaces_from_batch() {
        let analysis = Analysis::new(
            &individuals(&["A", "B", "M"]),
            &[family("F1", "B", "M", &["A"]), family("F2", "A", "M", &["B"])],
            &Config::default(),
        )
        .unwrap();

        assert!(matches!(
            analysis.inbreeding_all(),
            Err(AnalysisError::CyclicAncestry(_))
        ));
    }
}
