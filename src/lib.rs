//! Pedigree analysis
//!
//! Computes inbreeding (consanguinity) coefficients and the connected
//! components of a genealogical record graph built from individuals and the
//! family units that link them.

pub mod domain;
pub use domain::{
    ComponentFinder, Config, CyclicAncestryError, DanglingReferenceError, FamilyUnit, Individual,
    KinshipEngine, PersonId, ReferencePolicy, RelationshipGraph,
};

mod analysis;
pub use analysis::{Analysis, AnalysisError};

/// Loading record sets from disk.
pub mod storage;
pub use storage::{Dataset, LoadError};
