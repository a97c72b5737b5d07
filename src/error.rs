use std::path::PathBuf;

use thiserror::Error;

use crate::species::SpeciesRegistry;

/// Input that cannot be simulated. Always raised before the first step runs.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("species `{0}` is defined more than once")]
    DuplicateSpecies(String),
    #[error("unknown species `{0}`")]
    UnknownSpecies(String),
    #[error("species `{species}` references unknown resource `{resource}`")]
    UnknownResource { species: String, resource: String },
    #[error("species `{species}` preys on unknown species `{prey}`")]
    UnknownPrey { species: String, prey: String },
    #[error("species `{species}` lists prey `{prey}` more than once")]
    DuplicatePrey { species: String, prey: String },
    #[error("{field} of `{owner}` must be non-negative, got {value}")]
    Negative {
        field: &'static str,
        owner: String,
        value: f64,
    },
    #[error("{field} of `{owner}` must be finite")]
    NonFinite { field: &'static str, owner: String },
    #[error("time_steps must be at least 1")]
    ZeroTimeSteps,
    #[error("a sweep needs at least one species to vary")]
    NoSweptSpecies,
    #[error("growth-rate ceiling {ceiling} is below the floor {floor}")]
    CeilingBelowFloor { ceiling: f64, floor: f64 },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The tuner ran out of iterations. `last` is the registry evaluated on
    /// the final iteration, for callers that want to accept or resume from it.
    #[error("no stable configuration found after {iterations} iterations")]
    ConvergenceExhausted {
        iterations: usize,
        last: Box<SpeciesRegistry>,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid ecosystem document: {0}")]
    Parse(#[from] serde_json::Error),
}
