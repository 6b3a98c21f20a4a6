//! Domain models for pedigree analysis.
//!
//! This module contains the record types, the relationship graph derived from
//! them, and the two analyses that run over that graph.

/// Individual and family unit records.
pub mod person;
pub use person::{FamilyUnit, Individual, InvalidPersonId, PersonId};

/// Parent lookup and undirected adjacency built from a record set.
pub mod graph;
pub use graph::{DanglingReferenceError, Parents, ReferencePolicy, Relation, RelationshipGraph};

/// Kinship and inbreeding coefficients.
pub mod kinship;
pub use kinship::{CyclicAncestryError, KinshipEngine};

/// Connected components of the relationship graph.
pub mod components;
pub use components::{Component, ComponentFinder};

mod config;
pub use config::Config;
