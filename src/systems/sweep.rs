//! Batch sweep: one run per combination of starting populations and a
//! shared growth rate, summarised by each run's final state.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigurationError;
use crate::species::{ResourceLevels, SpeciesRegistry};
use crate::systems::engine::simulate;
use crate::table::Table;

/// Swept values. Every listed species takes every initial population
/// independently; all of them share each growth rate in turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepGrid {
    pub species: Vec<String>,
    pub initial_populations: Vec<f64>,
    pub growth_rates: Vec<f64>,
}

impl SweepGrid {
    /// Number of simulations the grid expands to.
    pub fn runs(&self) -> usize {
        let k = u32::try_from(self.species.len()).unwrap_or(u32::MAX);
        self.initial_populations
            .len()
            .saturating_pow(k)
            .saturating_mul(self.growth_rates.len())
    }
}

/// Run every grid point and collect one row per run: the swept initial
/// populations, the growth rate, then the final value of every column.
///
/// Runs are sequential and independent; each starts from a fresh copy of
/// `registry`. An empty value list yields a table with no rows.
pub fn sweep(
    registry: &SpeciesRegistry,
    initial_resource_levels: &ResourceLevels,
    time_steps: usize,
    grid: &SweepGrid,
) -> Result<Table, ConfigurationError> {
    if grid.species.is_empty() {
        return Err(ConfigurationError::NoSweptSpecies);
    }
    for name in &grid.species {
        if registry.position(name).is_none() {
            return Err(ConfigurationError::UnknownSpecies(name.clone()));
        }
    }

    let columns: Vec<String> = grid
        .species
        .iter()
        .map(|s| format!("{s}_initial"))
        .chain(std::iter::once("growth_rate".to_owned()))
        .chain(registry.names().map(str::to_owned))
        .chain(initial_resource_levels.names().map(str::to_owned))
        .collect();
    let mut table = Table::with_capacity(columns, grid.runs());

    if grid.initial_populations.is_empty() {
        return Ok(table);
    }

    let base = grid.initial_populations.len();
    let mut digits = vec![0usize; grid.species.len()];
    loop {
        let populations: Vec<f64> = digits.iter().map(|&d| grid.initial_populations[d]).collect();
        for &rate in &grid.growth_rates {
            let mut working = registry.clone();
            for (name, &n) in grid.species.iter().zip(&populations) {
                if let Some(s) = working.get_mut(name) {
                    s.initial_population = n;
                    s.growth_rate = rate;
                }
            }
            let result = simulate(&working, initial_resource_levels, time_steps)?;
            debug!(?populations, rate, "sweep point done");

            let mut row = populations.clone();
            row.push(rate);
            row.extend_from_slice(result.final_row().unwrap_or_default());
            table.push_row(row);
        }
        if !advance(&mut digits, base) {
            break;
        }
    }

    info!(runs = table.len(), "sweep finished");
    Ok(table)
}

/// Odometer increment, last digit fastest. `false` once every combination
/// has been produced.
fn advance(digits: &mut [usize], base: usize) -> bool {
    for d in digits.iter_mut().rev() {
        *d += 1;
        if *d < base {
            return true;
        }
        *d = 0;
    }
    false
}
