/// JSON record sets.
pub mod dataset;

pub use dataset::{Dataset, LoadError};
