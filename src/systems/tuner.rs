//! Parameter tuner: repeat simulate → evaluate → adjust until every tracked
//! quantity is stable.
//!
//! Two search policies, chosen per call and never mixed within a run:
//! - [`SearchPolicy::Directional`] moves each species' growth rate one
//!   `learning_rate` step against its trend (declining → up, growing → down).
//! - [`SearchPolicy::Randomized`] jitters every growth rate and initial
//!   population inside a band, seeded so a search can be replayed.
//!
//! Growth rates never fall below `growth_floor` (1 by default). The caller's
//! registry is never touched; the tuner works on its own copy.

use bevy_prng::WyRand;
use rand_core::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConfigurationError, Error};
use crate::mechanics::control::{bound, nudge};
use crate::mechanics::stoch::{int_jitter, jitter};
use crate::species::{ResourceLevels, SpeciesRegistry, non_negative};
use crate::systems::engine::{SimulationResult, simulate};
use crate::systems::sdk::{Observer, search_with_observers};
use crate::systems::stability::{StabilityPolicy, StabilityVerdict, Trend, evaluate};

pub const DEFAULT_LEARNING_RATE: f64 = 0.01;
pub const DEFAULT_GROWTH_FLOOR: f64 = 1.0;
pub const BOUNDED_GROWTH_CEILING: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SearchPolicy {
    Directional {
        learning_rate: f64,
        ceiling: Option<f64>,
    },
    Randomized {
        growth_rate_delta: f64,
        population_delta: u32,
        ceiling: Option<f64>,
        seed: u64,
    },
}

impl SearchPolicy {
    pub fn directional() -> Self {
        SearchPolicy::Directional {
            learning_rate: DEFAULT_LEARNING_RATE,
            ceiling: None,
        }
    }

    /// Directional search with growth rates capped at 2.
    pub fn bounded() -> Self {
        SearchPolicy::Directional {
            learning_rate: DEFAULT_LEARNING_RATE,
            ceiling: Some(BOUNDED_GROWTH_CEILING),
        }
    }

    pub fn randomized(seed: u64) -> Self {
        SearchPolicy::Randomized {
            growth_rate_delta: 0.1,
            population_delta: 10,
            ceiling: None,
            seed,
        }
    }

    fn ceiling(&self) -> f64 {
        match *self {
            SearchPolicy::Directional { ceiling, .. } | SearchPolicy::Randomized { ceiling, .. } => {
                ceiling.unwrap_or(f64::INFINITY)
            }
        }
    }
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self::directional()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuneConfig {
    pub max_iterations: usize,
    pub growth_floor: f64,
    pub stability: StabilityPolicy,
    pub policy: SearchPolicy,
}

impl Default for TuneConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
            growth_floor: DEFAULT_GROWTH_FLOOR,
            stability: StabilityPolicy::default(),
            policy: SearchPolicy::default(),
        }
    }
}

impl TuneConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_policy(mut self, policy: SearchPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        non_negative("growth_floor", "tuner", self.growth_floor)?;
        non_negative("tolerance", "tuner", self.stability.tolerance)?;
        let ceiling = match self.policy {
            SearchPolicy::Directional { learning_rate, ceiling } => {
                non_negative("learning_rate", "tuner", learning_rate)?;
                ceiling
            }
            SearchPolicy::Randomized {
                growth_rate_delta,
                ceiling,
                ..
            } => {
                non_negative("growth_rate_delta", "tuner", growth_rate_delta)?;
                ceiling
            }
        };
        if let Some(c) = ceiling {
            non_negative("ceiling", "tuner", c)?;
            if c < self.growth_floor {
                return Err(ConfigurationError::CeilingBelowFloor {
                    ceiling: c,
                    floor: self.growth_floor,
                });
            }
        }
        Ok(())
    }
}

enum Step {
    Steer {
        learning_rate: f64,
    },
    Perturb {
        rng: WyRand,
        growth_rate_delta: f64,
        population_delta: u32,
    },
}

/// A registry whose run came out stable everywhere.
#[derive(Clone, Debug)]
pub struct Tuned {
    pub registry: SpeciesRegistry,
    pub verdict: StabilityVerdict,
    /// Simulations run, including the accepted one.
    pub iterations: usize,
}

pub fn tune(
    registry: &SpeciesRegistry,
    initial_resource_levels: &ResourceLevels,
    time_steps: usize,
    config: &TuneConfig,
) -> Result<Tuned, Error> {
    tune_with_observers(registry, initial_resource_levels, time_steps, config, &mut [])
}

/// [`tune`] with observers that see every iteration's registry and verdict.
///
/// Returns [`Error::ConvergenceExhausted`] carrying the last evaluated
/// registry when the budget runs out.
pub fn tune_with_observers(
    registry: &SpeciesRegistry,
    initial_resource_levels: &ResourceLevels,
    time_steps: usize,
    config: &TuneConfig,
    observers: &mut [&mut dyn Observer<SpeciesRegistry, StabilityVerdict>],
) -> Result<Tuned, Error> {
    config.validate()?;
    let floor = config.growth_floor;
    let ceiling = config.policy.ceiling();
    let stability = config.stability;

    let mut step = match config.policy {
        SearchPolicy::Directional { learning_rate, .. } => Step::Steer { learning_rate },
        SearchPolicy::Randomized {
            growth_rate_delta,
            population_delta,
            seed,
            ..
        } => Step::Perturb {
            rng: WyRand::from_seed(seed.to_le_bytes()),
            growth_rate_delta,
            population_delta,
        },
    };

    let outcome = search_with_observers(
        registry.clone(),
        observers,
        config.max_iterations,
        |reg: &SpeciesRegistry| simulate(reg, initial_resource_levels, time_steps),
        |result: &SimulationResult| evaluate(result, &stability),
        StabilityVerdict::all_stable,
        |mut reg: SpeciesRegistry, verdict: &StabilityVerdict| {
            match &mut step {
                Step::Steer { learning_rate } => {
                    steer(&mut reg, verdict, *learning_rate, floor, ceiling)
                }
                Step::Perturb {
                    rng,
                    growth_rate_delta,
                    population_delta,
                } => perturb(&mut reg, rng, *growth_rate_delta, *population_delta, floor, ceiling),
            }
            reg
        },
    )?;

    match (outcome.converged, outcome.obs) {
        (true, Some(verdict)) => {
            info!(iterations = outcome.iters, "stable configuration found");
            Ok(Tuned {
                registry: outcome.theta,
                verdict,
                iterations: outcome.iters,
            })
        }
        _ => {
            warn!(iterations = outcome.iters, "no stable configuration within the iteration budget");
            Err(Error::ConvergenceExhausted {
                iterations: outcome.iters,
                last: Box::new(outcome.theta),
            })
        }
    }
}

/// Directional step: move each growth rate one `learning_rate` against its
/// species' trend, then keep it inside `[floor, ceiling]`.
pub fn steer(
    registry: &mut SpeciesRegistry,
    verdict: &StabilityVerdict,
    learning_rate: f64,
    floor: f64,
    ceiling: f64,
) {
    for s in registry.iter_mut() {
        let direction = verdict.get(&s.name).map_or(0.0, Trend::correction);
        s.growth_rate = nudge(s.growth_rate, direction, learning_rate, floor, ceiling);
    }
}

/// Randomized step: jitter every growth rate by up to `growth_rate_delta`
/// and every initial population by up to `population_delta` whole
/// individuals. Populations stay at least 1.
pub fn perturb(
    registry: &mut SpeciesRegistry,
    rng: &mut WyRand,
    growth_rate_delta: f64,
    population_delta: u32,
    floor: f64,
    ceiling: f64,
) {
    for s in registry.iter_mut() {
        s.growth_rate = bound(s.growth_rate + jitter(rng, growth_rate_delta), floor, ceiling);
        s.initial_population =
            (s.initial_population + int_jitter(rng, population_delta) as f64).max(1.0);
    }
}
