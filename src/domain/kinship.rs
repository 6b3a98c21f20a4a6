//! Kinship (Malécot's φ) and inbreeding coefficients.
//!
//! The two coefficients are defined in terms of each other:
//!
//! - `F(i) = 0` for a founder, otherwise `φ(father(i), mother(i))`
//! - `φ(a, a) = (1 + F(a)) / 2`
//! - `φ(a, b) = (φ(father(a), b) + φ(mother(a), b)) / 2` for `a ≠ b`, an
//!   absent parent contributing 0
//!
//! When `a` is a founder the expansion goes through `b`'s parents instead, and
//! two distinct founders have φ = 0. `F(a)` only ever needs φ of `a`'s
//! parents, never `φ(a, a)`, so the definitions are well founded on acyclic
//! pedigrees.
//!
//! Evaluation does not recurse on the call stack. Each query is resolved on an
//! explicit work stack that pushes one missing dependency at a time, so the
//! stack always mirrors the recursive call path and the memo tables fill in
//! the same order a recursive evaluation would fill them. That order matters:
//! expanding through the first argument is not symmetric when it is an
//! ancestor of the second, and whichever orientation is evaluated first is the
//! one cached for the unordered pair.

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;
use tracing::{instrument, trace};

use crate::domain::{PersonId, RelationshipGraph};

/// The ancestry reachable from a query loops back on itself.
///
/// Reported when evaluation revisits a query that is still in progress on the
/// active evaluation path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cyclic ancestry detected while relating {first} to {second}")]
pub struct CyclicAncestryError {
    /// First individual of the revisited query.
    pub first: PersonId,
    /// Second individual of the revisited query. Equal to `first` when the
    /// revisited query was an inbreeding coefficient.
    pub second: PersonId,
}

/// Kinship pair with the ids in canonical (sorted) order.
type PairKey = (PersonId, PersonId);

fn pair_key(a: &PersonId, b: &PersonId) -> PairKey {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

#[derive(Debug)]
enum Query {
    /// φ(a, b), expanded in argument order.
    Kinship(PersonId, PersonId),
    /// F(i).
    Inbreeding(PersonId),
}

/// Identity of a query for cycle tracking. Kinship is unordered.
#[derive(Debug, PartialEq, Eq, Hash)]
enum QueryKey {
    Kinship(PairKey),
    Inbreeding(PersonId),
}

impl Query {
    fn key(&self) -> QueryKey {
        match self {
            Self::Kinship(a, b) => QueryKey::Kinship(pair_key(a, b)),
            Self::Inbreeding(id) => QueryKey::Inbreeding(id.clone()),
        }
    }

    fn into_cycle_error(self) -> CyclicAncestryError {
        match self {
            Self::Kinship(first, second) => CyclicAncestryError { first, second },
            Self::Inbreeding(id) => CyclicAncestryError {
                first: id.clone(),
                second: id,
            },
        }
    }
}

/// Computes kinship and inbreeding coefficients over one relationship graph.
///
/// The memo tables live as long as the engine. Give each worker its own engine
/// when evaluating in parallel.
#[derive(Debug)]
pub struct KinshipEngine<'g> {
    graph: &'g RelationshipGraph,
    kinship: HashMap<PairKey, f64>,
    inbreeding: HashMap<PersonId, f64>,
}

impl<'g> KinshipEngine<'g> {
    /// Creates an engine with empty memo tables.
    #[must_use]
    pub fn new(graph: &'g RelationshipGraph) -> Self {
        Self {
            graph,
            kinship: HashMap::new(),
            inbreeding: HashMap::new(),
        }
    }

    /// The kinship coefficient φ(a, b), in `[0, 1]`.
    ///
    /// Ids the graph has never seen are founders.
    ///
    /// # Errors
    ///
    /// Returns [`CyclicAncestryError`] if the ancestry reachable from `a` and
    /// `b` contains a cycle.
    pub fn kinship(&mut self, a: &PersonId, b: &PersonId) -> Result<f64, CyclicAncestryError> {
        self.resolve(Query::Kinship(a.clone(), b.clone()))
    }

    /// The inbreeding coefficient F(id), in `[0, 1]`.
    ///
    /// Founders, including ids the graph has never seen, have F = 0.
    ///
    /// # Errors
    ///
    /// Returns [`CyclicAncestryError`] if the ancestry of `id` contains a
    /// cycle.
    pub fn inbreeding(&mut self, id: &PersonId) -> Result<f64, CyclicAncestryError> {
        self.resolve(Query::Inbreeding(id.clone()))
    }

    /// Inbreeding coefficients of every supplied individual.
    ///
    /// Individuals are evaluated in input order.
    ///
    /// # Errors
    ///
    /// Returns the first [`CyclicAncestryError`] encountered.
    #[instrument(skip(self), fields(individuals = self.graph.individuals().len()))]
    pub fn inbreeding_all(&mut self) -> Result<BTreeMap<PersonId, f64>, CyclicAncestryError> {
        let graph = self.graph;
        self.inbreeding_of(graph.individuals())
    }

    /// Inbreeding coefficients of `ids`, evaluated in the order given.
    ///
    /// # Errors
    ///
    /// Returns the first [`CyclicAncestryError`] encountered.
    pub fn inbreeding_of<'a>(
        &mut self,
        ids: impl IntoIterator<Item = &'a PersonId>,
    ) -> Result<BTreeMap<PersonId, f64>, CyclicAncestryError> {
        ids.into_iter()
            .map(|id| Ok((id.clone(), self.inbreeding(id)?)))
            .collect()
    }

    /// Number of memoised kinship pairs.
    #[must_use]
    pub fn cached_pairs(&self) -> usize {
        self.kinship.len()
    }

    fn resolve(&mut self, root: Query) -> Result<f64, CyclicAncestryError> {
        let mut stack = vec![root];
        let mut active: HashSet<QueryKey> = stack.iter().map(Query::key).collect();
        let mut value = 0.0;

        // The root is the last query popped, so `value` ends up holding its result.
        while let Some(top) = stack.last() {
            match self.evaluate(top) {
                Ok(resolved) => {
                    value = resolved;
                    if let Some(done) = stack.pop() {
                        active.remove(&done.key());
                        self.store(done, resolved);
                    }
                }
                Err(dependency) => {
                    if !active.insert(dependency.key()) {
                        return Err(dependency.into_cycle_error());
                    }
                    trace!(depth = stack.len(), ?dependency, "expanding");
                    stack.push(dependency);
                }
            }
        }

        Ok(value)
    }

    /// Computes `query` from the memo tables.
    ///
    /// `Err` carries the first dependency that is not yet memoised.
    fn evaluate(&self, query: &Query) -> Result<f64, Query> {
        match query {
            Query::Inbreeding(id) => {
                if let Some(&value) = self.inbreeding.get(id) {
                    return Ok(value);
                }
                match self.graph.parents(id) {
                    Some(parents) if !parents.is_founder() => {
                        self.lookup(parents.father.as_ref(), parents.mother.as_ref())
                    }
                    _ => Ok(0.0),
                }
            }
            Query::Kinship(a, b) => {
                if let Some(&value) = self.kinship.get(&pair_key(a, b)) {
                    return Ok(value);
                }

                if a == b {
                    let f = self
                        .inbreeding
                        .get(a)
                        .copied()
                        .ok_or_else(|| Query::Inbreeding(a.clone()))?;
                    return Ok((1.0 + f) / 2.0);
                }

                match (self.graph.parents(a), self.graph.parents(b)) {
                    (Some(pa), _) if !pa.is_founder() => {
                        let through_father = self.lookup(pa.father.as_ref(), Some(b))?;
                        let through_mother = self.lookup(pa.mother.as_ref(), Some(b))?;
                        Ok((through_father + through_mother) / 2.0)
                    }
                    (_, Some(pb)) if !pb.is_founder() => {
                        let through_father = self.lookup(Some(a), pb.father.as_ref())?;
                        let through_mother = self.lookup(Some(a), pb.mother.as_ref())?;
                        Ok((through_father + through_mother) / 2.0)
                    }
                    _ => Ok(0.0),
                }
            }
        }
    }

    /// φ(a, b) if it is known without further work. An absent side is 0.
    fn lookup(&self, a: Option<&PersonId>, b: Option<&PersonId>) -> Result<f64, Query> {
        let (Some(a), Some(b)) = (a, b) else {
            return Ok(0.0);
        };
        self.kinship
            .get(&pair_key(a, b))
            .copied()
            .ok_or_else(|| Query::Kinship(a.clone(), b.clone()))
    }

    fn store(&mut self, query: Query, value: f64) {
        match query {
            Query::Kinship(a, b) => {
                self.kinship.insert(pair_key(&a, &b), value);
            }
            Query::Inbreeding(id) => {
                self.inbreeding.insert(id, value);
            }
        }
    }
}
