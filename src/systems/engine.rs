//! Simulation engine: the per-step food-web recurrence.
//!
//! Each step reads only the previous step's committed state:
//! 1. resources move by production minus consumption of every species;
//! 2. predators spread their headcount evenly over their prey as loss;
//! 3. each species gets a capacity from its scarcest resource, its scarcest
//!    prey and its explicit cap;
//! 4. populations take one logistic step, lose what was eaten, clamp at zero.
//!
//! A zero capacity holds the logistic term (no growth, no shrinkage) and is
//! recorded as a [`Degeneracy`] rather than an error.

use serde::Serialize;
use tracing::debug;

use crate::error::ConfigurationError;
use crate::mechanics::logistic::{after_predation, capacity, logistic, min_or_inf};
use crate::species::{Links, ResourceLevels, Species, SpeciesRegistry};
use crate::table::Table;

/// A step where a species met zero carrying capacity and was held in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Degeneracy {
    pub step: usize,
    pub species: String,
}

/// Full time series of one run: species columns first, then resources.
#[derive(Clone, Debug)]
pub struct SimulationResult {
    table: Table,
    species_count: usize,
    degeneracies: Vec<Degeneracy>,
}

impl SimulationResult {
    pub fn columns(&self) -> &[String] {
        self.table.columns()
    }

    pub fn species_columns(&self) -> &[String] {
        &self.table.columns()[..self.species_count]
    }

    pub fn resource_columns(&self) -> &[String] {
        &self.table.columns()[self.species_count..]
    }

    pub fn species_count(&self) -> usize {
        self.species_count
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        self.table.rows()
    }

    pub fn row(&self, step: usize) -> Option<&[f64]> {
        self.table.row(step)
    }

    pub fn final_row(&self) -> Option<&[f64]> {
        self.table.rows().last().map(Vec::as_slice)
    }

    pub fn time_steps(&self) -> usize {
        self.table.len()
    }

    /// Value of a species or resource at `step`.
    pub fn value(&self, step: usize, name: &str) -> Option<f64> {
        let j = self.table.column_index(name)?;
        self.table.row(step).map(|r| r[j])
    }

    pub fn series(&self, name: &str) -> Option<Vec<f64>> {
        self.table.column(name)
    }

    pub fn degeneracies(&self) -> &[Degeneracy] {
        &self.degeneracies
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}

/// Run `time_steps` rows (row 0 is the initial state) without touching the
/// inputs. Fails before the first step if any reference or value is invalid.
pub fn simulate(
    registry: &SpeciesRegistry,
    initial_resource_levels: &ResourceLevels,
    time_steps: usize,
) -> Result<SimulationResult, ConfigurationError> {
    if time_steps == 0 {
        return Err(ConfigurationError::ZeroTimeSteps);
    }
    initial_resource_levels.validate()?;
    registry.check_values()?;
    let links = registry.resolve(initial_resource_levels)?;
    let species = registry.species();

    let columns: Vec<String> = registry
        .names()
        .chain(initial_resource_levels.names())
        .map(str::to_owned)
        .collect();
    let mut table = Table::with_capacity(columns, time_steps);

    let mut populations: Vec<f64> = species.iter().map(|s| s.initial_population).collect();
    let mut levels: Vec<f64> = initial_resource_levels.iter().map(|(_, v)| v).collect();
    let mut degeneracies = Vec::new();
    table.push_row(snapshot(&populations, &levels));

    for step in 1..time_steps {
        let next_levels = exchange(species, &links, &populations, &levels);
        let eaten = predation(&links, &populations);

        let mut next = Vec::with_capacity(populations.len());
        for (i, s) in species.iter().enumerate() {
            let n = populations[i];
            let k = capacity(
                min_or_inf(links[i].consumes.iter().map(|&g| next_levels[g])),
                min_or_inf(links[i].prey.iter().map(|&p| populations[p])),
                s.carrying_capacity,
            );
            if k == 0.0 {
                debug!(step, species = %s.name, population = n, "zero carrying capacity, holding population");
                degeneracies.push(Degeneracy {
                    step,
                    species: s.name.clone(),
                });
            }
            next.push(after_predation(logistic(n, s.growth_rate, k), eaten[i]));
        }

        populations = next;
        levels = next_levels;
        table.push_row(snapshot(&populations, &levels));
    }

    Ok(SimulationResult {
        table,
        species_count: species.len(),
        degeneracies,
    })
}

/// New resource levels from the previous step's populations, clamped at zero.
fn exchange(species: &[Species], links: &[Links], populations: &[f64], levels: &[f64]) -> Vec<f64> {
    let mut produced = vec![0.0; levels.len()];
    let mut consumed = vec![0.0; levels.len()];
    for (i, s) in species.iter().enumerate() {
        let flow = s.exchange_rate * populations[i];
        for &g in &links[i].produces {
            produced[g] += flow;
        }
        for &g in &links[i].consumes {
            consumed[g] += flow;
        }
    }
    levels
        .iter()
        .zip(produced.iter().zip(&consumed))
        .map(|(level, (p, c))| (level + (p - c)).max(0.0))
        .collect()
}

/// Biomass removed from each species this step. A predator's headcount is
/// split evenly across its prey list.
fn predation(links: &[Links], populations: &[f64]) -> Vec<f64> {
    let mut eaten = vec![0.0; populations.len()];
    for (i, l) in links.iter().enumerate() {
        if l.prey.is_empty() {
            continue;
        }
        let share = populations[i] / l.prey.len() as f64;
        for &p in &l.prey {
            eaten[p] += share;
        }
    }
    eaten
}

fn snapshot(populations: &[f64], levels: &[f64]) -> Vec<f64> {
    populations.iter().chain(levels).copied().collect()
}
