// src/systems/sdk.rs

//! # Systems SDK
//!
//! Small harness shared by the search loops in this crate. A *system* owns a
//! parameter token `θ` (here: a species registry) and an observable `π`
//! (here: a stability verdict) and drives `θ` until `π` is acceptable.
//!
//! ## What this SDK gives you
//! - [`search_with_observers`], which wires your closures into the base
//!   refinement loop ([`crate::refine`]) and fans every iteration out to a
//!   list of observers.
//! - The [`Observer`] protocol, so reporting and recording can ride along
//!   without touching the search itself.
//! - A standard [`Outcome`] return (θ, π, iters, converged).
//!
//! ## Observers
//! - `on_observe(iteration, &θ, &π)`: after every evaluation, including the
//!   accepted one.
//! - `on_adjust(iteration, &θ')`: with the parameters the next iteration
//!   will run.
//!
//! Observers see, they never steer. Search policy lives in the `adjust`
//! closure only.
//!
//! ## Determinism
//! Keep simulate/measure/adjust pure. If `adjust` needs randomness, seed it
//! explicitly so a search can be replayed.

use std::cell::{Cell, RefCell};

use tracing::debug;

use crate::refine;

/// Hook that watches a search iteration by iteration.
pub trait Observer<TParams, Obs> {
    fn on_observe(&mut self, _iteration: usize, _theta: &TParams, _obs: &Obs) {}
    fn on_adjust(&mut self, _iteration: usize, _next: &TParams) {}
}

/// Records every evaluated `(θ, π)` pair.
#[derive(Clone, Debug)]
pub struct History<TParams, Obs> {
    pub entries: Vec<(TParams, Obs)>,
}

impl<TParams, Obs> Default for History<TParams, Obs> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<TParams: Clone, Obs: Clone> Observer<TParams, Obs> for History<TParams, Obs> {
    fn on_observe(&mut self, _iteration: usize, theta: &TParams, obs: &Obs) {
        self.entries.push((theta.clone(), obs.clone()));
    }
}

/// Generic result.
#[derive(Clone, Debug)]
pub struct Outcome<TParams, Obs> {
    pub theta: TParams,
    /// `None` only when the budget was zero.
    pub obs: Option<Obs>,
    pub iters: usize,
    pub converged: bool,
}

/// Generic harness: simulate, measure, accept or adjust, with observers.
pub fn search_with_observers<TParams, Data, Obs, E>(
    theta0: TParams,
    observers: &mut [&mut dyn Observer<TParams, Obs>],
    max_iters: usize,
    simulate: impl FnMut(&TParams) -> Result<Data, E>,
    measure: impl FnMut(&Data) -> Obs,
    accept: impl Fn(&Obs) -> bool,
    mut adjust: impl FnMut(TParams, &Obs) -> TParams,
) -> Result<Outcome<TParams, Obs>, E> {
    let observers = RefCell::new(observers);
    let iteration = Cell::new(0usize);

    let out = refine(
        theta0,
        simulate,
        measure,
        |theta: &TParams, obs: &Obs| {
            iteration.set(iteration.get() + 1);
            for o in observers.borrow_mut().iter_mut() {
                o.on_observe(iteration.get(), theta, obs);
            }
            let ok = accept(obs);
            debug!(iteration = iteration.get(), accepted = ok, "search iteration evaluated");
            ok
        },
        |theta, obs| {
            let next = adjust(theta, obs);
            for o in observers.borrow_mut().iter_mut() {
                o.on_adjust(iteration.get(), &next);
            }
            next
        },
        max_iters,
    )?;

    Ok(Outcome {
        theta: out.theta,
        obs: out.metrics,
        iters: out.iters,
        converged: out.converged,
    })
}
