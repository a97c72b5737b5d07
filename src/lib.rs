/*!
`foodweb_balance` — discrete-time food-web simulation with a closed-loop
stability search.

What it does
- Evolves species populations coupled to shared resources (gases, nutrients)
  through production, consumption and predation, one logistic step at a time.
- Classifies the recent trend of every tracked quantity as declining, stable
  or growing.
- Searches growth-rate space for a configuration whose long-run trajectories
  are flat, by composing the three pieces into one refinement step
  `g(θ) = update(θ, measure(simulate(θ)))`.

How to use (call surface only)
- Build a validated [`SpeciesRegistry`] and [`ResourceLevels`], either by hand
  or from an [`EcosystemConfig`] document.
- [`systems::engine::simulate`] produces a [`SimulationResult`] table.
- [`systems::stability::evaluate`] turns a result into a [`StabilityVerdict`].
- [`systems::tuner::tune`] repeats simulate → evaluate → adjust until every
  verdict is stable or the iteration budget runs out.

What it does NOT do
- No continuous-time integration, no concurrency, no plotting. File formats
  stop at JSON in and delimited text out.
*/

pub mod config;
pub mod error;
pub mod mechanics;
pub mod species;
pub mod systems;
pub mod table;

pub use config::EcosystemConfig;
pub use error::{ConfigurationError, Error};
pub use species::{ResourceLevels, SimulationParameters, Species, SpeciesRegistry};
pub use systems::engine::{Degeneracy, SimulationResult};
pub use systems::stability::{StabilityPolicy, StabilityVerdict, Trend};
pub use systems::tuner::{SearchPolicy, TuneConfig, Tuned};
pub use table::Table;

/// What a refinement loop ended with.
#[derive(Clone, Debug)]
pub struct Refinement<P, M> {
    /// Last parameters that were simulated and measured.
    pub theta: P,
    /// Measurement of `theta` (`None` only when no iteration ran).
    pub metrics: Option<M>,
    pub iters: usize,
    pub converged: bool,
}

/// Refinement: θ_{t+1} = update(θ_t, measure(simulate(θ_t))).
///
/// Stops as soon as `accept` holds for a measurement, or after `max_iters`
/// simulations. `accept` sees every measurement exactly once, so it is also
/// the place for per-iteration bookkeeping. The final iteration is never
/// followed by an update, so `theta` and `metrics` in the returned
/// [`Refinement`] always belong together.
/// A failing `simulate` aborts the loop with its error.
pub fn refine<P, D, M, E, Sim, Meas, Acc, Upd>(
    mut theta: P,
    mut simulate: Sim,
    mut measure: Meas,
    mut accept: Acc,
    mut update: Upd,
    max_iters: usize,
) -> Result<Refinement<P, M>, E>
where
    Sim: FnMut(&P) -> Result<D, E>,
    Meas: FnMut(&D) -> M,
    Acc: FnMut(&P, &M) -> bool,
    Upd: FnMut(P, &M) -> P,
{
    let mut last = None;
    for i in 0..max_iters {
        let data = simulate(&theta)?;
        let pi = measure(&data);
        if accept(&theta, &pi) {
            return Ok(Refinement {
                theta,
                metrics: Some(pi),
                iters: i + 1,
                converged: true,
            });
        }
        if i + 1 < max_iters {
            theta = update(theta, &pi);
        }
        last = Some(pi);
    }
    Ok(Refinement {
        theta,
        metrics: last,
        iters: max_iters,
        converged: false,
    })
}
