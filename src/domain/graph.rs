//! The relationship graph derived from a record set.
//!
//! A [`RelationshipGraph`] holds two views over the same records:
//! - the parent lookup: for each individual, the father and mother recorded by
//!   the last family unit listing them as a child
//! - an undirected adjacency graph linking spouses and parent/child pairs
//!
//! Nothing here knows where the records came from.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{FamilyUnit, Individual, PersonId};

/// The recorded parents of an individual.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parents {
    /// The father, if known.
    pub father: Option<PersonId>,
    /// The mother, if known.
    pub mother: Option<PersonId>,
}

impl Parents {
    /// An individual with no recorded parents is a founder.
    #[must_use]
    pub const fn is_founder(&self) -> bool {
        self.father.is_none() && self.mother.is_none()
    }
}

/// The kind of link an edge in the adjacency graph stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Father and mother of the same family unit.
    Spouse,
    /// A parent and one of their children.
    ParentChild,
}

/// How to treat family units that reference ids absent from the individual
/// set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePolicy {
    /// Absorb unknown ids into the graph as extra vertices.
    #[default]
    Lenient,
    /// Reject the record set at the first unknown id.
    Strict,
    /// Drop references to unknown ids before building the graph.
    Prune,
}

/// A family unit references an individual that is not in the record set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("family {family} references unknown individual {missing}")]
pub struct DanglingReferenceError {
    /// Identifier of the offending family unit.
    pub family: String,
    /// The id that could not be found.
    pub missing: PersonId,
}

/// Parent lookup and adjacency structure for one record set.
#[derive(Debug, Default)]
pub struct RelationshipGraph {
    /// The supplied individuals, in input order, without duplicates.
    individuals: Vec<PersonId>,

    /// Parents of every individual, founders included.
    parents: HashMap<PersonId, Parents>,

    /// Undirected links. Node weights are the individual ids.
    graph: UnGraph<PersonId, Relation>,

    /// Lookup from id to node in `graph`.
    nodes: HashMap<PersonId, NodeIndex>,
}

impl RelationshipGraph {
    /// Builds the graph with the default (lenient) reference policy.
    ///
    /// Never fails: unknown ids are absorbed.
    #[must_use]
    pub fn new(individuals: &[Individual], families: &[FamilyUnit]) -> Self {
        let mut builder = Builder::new(individuals, ReferencePolicy::Lenient);
        for family in families {
            builder.add_family(family);
        }
        builder.finish()
    }

    /// Builds the graph, applying `policy` to references to unknown ids.
    ///
    /// # Errors
    ///
    /// Returns [`DanglingReferenceError`] for the first unknown id when
    /// `policy` is [`ReferencePolicy::Strict`].
    #[instrument(skip_all, fields(individuals = individuals.len(), families = families.len()))]
    pub fn build(
        individuals: &[Individual],
        families: &[FamilyUnit],
        policy: ReferencePolicy,
    ) -> Result<Self, DanglingReferenceError> {
        let mut builder = Builder::new(individuals, policy);

        for family in families {
            if policy == ReferencePolicy::Strict {
                builder.check_family(family)?;
            }
            builder.add_family(family);
        }

        let graph = builder.finish();
        debug!(
            vertices = graph.vertex_count(),
            edges = graph.graph.edge_count(),
            "relationship graph built"
        );
        Ok(graph)
    }

    /// The supplied individuals, in input order.
    #[must_use]
    pub fn individuals(&self) -> &[PersonId] {
        &self.individuals
    }

    /// Recorded parents of `id`.
    ///
    /// Returns `None` for ids the graph has never seen; callers treat those as
    /// founders.
    #[must_use]
    pub fn parents(&self, id: &PersonId) -> Option<&Parents> {
        self.parents.get(id)
    }

    /// Number of vertices, absorbed unknown ids included.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub(crate) const fn adjacency(&self) -> &UnGraph<PersonId, Relation> {
        &self.graph
    }
}

struct Builder {
    policy: ReferencePolicy,
    known: HashSet<PersonId>,
    graph: RelationshipGraph,
}

impl Builder {
    fn new(individuals: &[Individual], policy: ReferencePolicy) -> Self {
        let mut builder = Self {
            policy,
            known: HashSet::with_capacity(individuals.len()),
            graph: RelationshipGraph {
                individuals: Vec::with_capacity(individuals.len()),
                parents: HashMap::with_capacity(individuals.len()),
                graph: UnGraph::with_capacity(individuals.len(), individuals.len() * 2),
                nodes: HashMap::with_capacity(individuals.len()),
            },
        };

        for individual in individuals {
            if builder.known.insert(individual.id.clone()) {
                builder.graph.individuals.push(individual.id.clone());
                builder
                    .graph
                    .parents
                    .insert(individual.id.clone(), Parents::default());
                builder.node(&individual.id);
            }
        }

        builder
    }

    fn check_family(&self, family: &FamilyUnit) -> Result<(), DanglingReferenceError> {
        family
            .parents()
            .chain(&family.children)
            .find(|id| !self.known.contains(*id))
            .map_or(Ok(()), |missing| {
                Err(DanglingReferenceError {
                    family: family.id.clone(),
                    missing: missing.clone(),
                })
            })
    }

    /// Resolves a reference according to the policy. `None` means drop it.
    fn accept<'a>(&self, family: &FamilyUnit, id: &'a PersonId) -> Option<&'a PersonId> {
        if self.known.contains(id) {
            return Some(id);
        }
        match self.policy {
            ReferencePolicy::Prune => {
                debug!(family = %family.id, %id, "dropping reference to unknown individual");
                None
            }
            ReferencePolicy::Lenient | ReferencePolicy::Strict => {
                debug!(family = %family.id, %id, "absorbing unknown individual");
                Some(id)
            }
        }
    }

    fn add_family(&mut self, family: &FamilyUnit) {
        let father = family.father.as_ref().and_then(|id| self.accept(family, id));
        let mother = family.mother.as_ref().and_then(|id| self.accept(family, id));

        if let (Some(father), Some(mother)) = (father, mother) {
            self.link(father, mother, Relation::Spouse);
        }

        for child in &family.children {
            let Some(child) = self.accept(family, child) else {
                continue;
            };

            // Last family listing the child wins.
            self.graph.parents.insert(
                child.clone(),
                Parents {
                    father: father.cloned(),
                    mother: mother.cloned(),
                },
            );

            for parent in father.into_iter().chain(mother) {
                self.link(parent, child, Relation::ParentChild);
            }
        }
    }

    /// Supplied individuals get a vertex up front. Absorbed ids only get one
    /// through [`Self::link`], so they never stand alone.
    fn node(&mut self, id: &PersonId) -> NodeIndex {
        if let Some(&index) = self.graph.nodes.get(id) {
            return index;
        }
        let index = self.graph.graph.add_node(id.clone());
        self.graph.nodes.insert(id.clone(), index);
        index
    }

    fn link(&mut self, a: &PersonId, b: &PersonId, relation: Relation) {
        let a = self.node(a);
        let b = self.node(b);
        self.graph.graph.update_edge(a, b, relation);
    }

    fn finish(self) -> RelationshipGraph {
        self.graph
    }
}
