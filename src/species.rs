//! Species registry, resource levels and run parameters.
//!
//! Everything here is validated once on construction. Runs take deep copies,
//! so a registry handed to the engine or the tuner is never mutated in place.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::ConfigurationError;

fn default_exchange_rate() -> f64 {
    1.0
}

/// Static attributes of one organism.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub name: String,
    pub initial_population: f64,
    pub growth_rate: f64,
    /// Resources drawn down each step. Repeats weight the effect.
    #[serde(default)]
    pub consumes: Vec<String>,
    /// Resources released each step. Repeats weight the effect.
    #[serde(default)]
    pub produces: Vec<String>,
    #[serde(default)]
    pub prey: Vec<String>,
    /// Explicit population cap; absent means derived from resources and prey.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrying_capacity: Option<f64>,
    /// Units of resource exchanged per individual per step.
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: f64,
}

impl Species {
    pub fn new(name: impl Into<String>, initial_population: f64, growth_rate: f64) -> Self {
        Self {
            name: name.into(),
            initial_population,
            growth_rate,
            consumes: Vec::new(),
            produces: Vec::new(),
            prey: Vec::new(),
            carrying_capacity: None,
            exchange_rate: default_exchange_rate(),
        }
    }

    pub fn consumes<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.consumes.extend(resources.into_iter().map(Into::into));
        self
    }

    pub fn produces<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.produces.extend(resources.into_iter().map(Into::into));
        self
    }

    pub fn preys_on<I, S>(mut self, prey: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prey.extend(prey.into_iter().map(Into::into));
        self
    }

    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.carrying_capacity = Some(capacity);
        self
    }

    pub fn with_exchange_rate(mut self, rate: f64) -> Self {
        self.exchange_rate = rate;
        self
    }
}

/// Resource name → non-negative level, iterated in key order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceLevels(BTreeMap<String, f64>);

impl ResourceLevels {
    /// Validated levels: every value finite and `>= 0`.
    pub fn new<I, S>(levels: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let out = Self(levels.into_iter().map(|(k, v)| (k.into(), v)).collect());
        out.validate()?;
        Ok(out)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (name, &level) in &self.0 {
            non_negative("initial resource level", name, level)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.0.keys().position(|k| k == name)
    }
}

/// Fixed for the duration of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub time_steps: usize,
}

impl SimulationParameters {
    pub fn new(time_steps: usize) -> Result<Self, ConfigurationError> {
        let out = Self { time_steps };
        out.validate()?;
        Ok(out)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.time_steps == 0 {
            return Err(ConfigurationError::ZeroTimeSteps);
        }
        Ok(())
    }
}

/// Species names resolved to column indices for one set of resources.
#[derive(Clone, Debug, Default)]
pub(crate) struct Links {
    pub consumes: Vec<usize>,
    pub produces: Vec<usize>,
    pub prey: Vec<usize>,
}

/// Validated, ordered set of species.
#[derive(Clone, Debug)]
pub struct SpeciesRegistry {
    species: Vec<Species>,
    index: HashMap<String, usize>,
}

impl SpeciesRegistry {
    /// Checks names, numeric ranges and every `consumes`/`produces`/`prey`
    /// reference against `resources`.
    pub fn new(
        species: Vec<Species>,
        resources: &ResourceLevels,
    ) -> Result<Self, ConfigurationError> {
        let mut index = HashMap::with_capacity(species.len());
        for (i, s) in species.iter().enumerate() {
            if index.insert(s.name.clone(), i).is_some() {
                return Err(ConfigurationError::DuplicateSpecies(s.name.clone()));
            }
        }
        let out = Self { species, index };
        out.check_values()?;
        out.resolve(resources)?;
        Ok(out)
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn get(&self, name: &str) -> Option<&Species> {
        self.index.get(name).map(|&i| &self.species[i])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.species.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn into_species(self) -> Vec<Species> {
        self.species
    }

    /// Names and references stay fixed; only numeric fields may be touched.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Species> {
        self.species.iter_mut()
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Species> {
        let i = *self.index.get(name)?;
        Some(&mut self.species[i])
    }

    pub(crate) fn check_values(&self) -> Result<(), ConfigurationError> {
        for s in &self.species {
            non_negative("initial_population", &s.name, s.initial_population)?;
            non_negative("growth_rate", &s.name, s.growth_rate)?;
            non_negative("exchange_rate", &s.name, s.exchange_rate)?;
            if let Some(k) = s.carrying_capacity {
                non_negative("carrying_capacity", &s.name, k)?;
            }
        }
        Ok(())
    }

    /// Resolve every reference to a resource column or species index.
    pub(crate) fn resolve(
        &self,
        resources: &ResourceLevels,
    ) -> Result<Vec<Links>, ConfigurationError> {
        let resource = |species: &Species, name: &String| {
            resources
                .position(name)
                .ok_or_else(|| ConfigurationError::UnknownResource {
                    species: species.name.clone(),
                    resource: name.clone(),
                })
        };
        self.species
            .iter()
            .map(|s| {
                let consumes = s
                    .consumes
                    .iter()
                    .map(|g| resource(s, g))
                    .collect::<Result<_, _>>()?;
                let produces = s
                    .produces
                    .iter()
                    .map(|g| resource(s, g))
                    .collect::<Result<_, _>>()?;
                let mut seen = HashSet::with_capacity(s.prey.len());
                let mut prey = Vec::with_capacity(s.prey.len());
                for p in &s.prey {
                    let idx = self.position(p).ok_or_else(|| ConfigurationError::UnknownPrey {
                        species: s.name.clone(),
                        prey: p.clone(),
                    })?;
                    if !seen.insert(idx) {
                        return Err(ConfigurationError::DuplicatePrey {
                            species: s.name.clone(),
                            prey: p.clone(),
                        });
                    }
                    prey.push(idx);
                }
                Ok(Links {
                    consumes,
                    produces,
                    prey,
                })
            })
            .collect()
    }
}

impl Serialize for SpeciesRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.species)
    }
}

pub(crate) fn non_negative(field: &'static str, owner: &str, value: f64) -> Result<(), ConfigurationError> {
    if !value.is_finite() {
        return Err(ConfigurationError::NonFinite {
            field,
            owner: owner.to_owned(),
        });
    }
    if value < 0.0 {
        return Err(ConfigurationError::Negative {
            field,
            owner: owner.to_owned(),
            value,
        });
    }
    Ok(())
}
