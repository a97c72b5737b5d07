//! Ecosystem document: species list, starting resource levels and run length.
//!
//! ```json
//! {
//!   "species": [
//!     { "name": "Algae", "initial_population": 10, "growth_rate": 1.5,
//!       "consumes": ["CO2"], "produces": ["O2"], "prey": [] }
//!   ],
//!   "initial_resource_levels": { "CO2": 1000, "O2": 1000 },
//!   "simulation_parameters": { "time_steps": 100 }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::species::{ResourceLevels, SimulationParameters, Species, SpeciesRegistry};

/// Parsed but not yet validated document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EcosystemConfig {
    pub species: Vec<Species>,
    #[serde(default)]
    pub initial_resource_levels: ResourceLevels,
    pub simulation_parameters: SimulationParameters,
}

/// Validated pieces of a document, ready to hand to the engine or tuner.
#[derive(Clone, Debug)]
pub struct Ecosystem {
    pub registry: SpeciesRegistry,
    pub resources: ResourceLevels,
    pub parameters: SimulationParameters,
}

impl EcosystemConfig {
    pub fn from_json_str(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Validate every value and reference.
    pub fn build(self) -> Result<Ecosystem, Error> {
        self.initial_resource_levels.validate()?;
        self.simulation_parameters.validate()?;
        let registry = SpeciesRegistry::new(self.species, &self.initial_resource_levels)?;
        Ok(Ecosystem {
            registry,
            resources: self.initial_resource_levels,
            parameters: self.simulation_parameters,
        })
    }
}

impl Ecosystem {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        EcosystemConfig::from_path(path)?.build()
    }
}
