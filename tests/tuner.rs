// tests/tuner.rs
use foodweb_balance::systems::engine::simulate;
use foodweb_balance::systems::sdk::{History, Observer};
use foodweb_balance::systems::stability::evaluate;
use foodweb_balance::systems::tuner::{BOUNDED_GROWTH_CEILING, steer, tune, tune_with_observers};
use foodweb_balance::{
    ConfigurationError, Error, ResourceLevels, SearchPolicy, Species, SpeciesRegistry,
    StabilityPolicy, StabilityVerdict, TuneConfig,
};

fn registry(species: Vec<Species>) -> SpeciesRegistry {
    SpeciesRegistry::new(species, &ResourceLevels::default()).unwrap()
}

fn exhausted(err: Error) -> (usize, SpeciesRegistry) {
    match err {
        Error::ConvergenceExhausted { iterations, last } => (iterations, *last),
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

/* ──────────────────────────────────────────────────────────────────────────
1) Fixed point accepted on the first iteration
────────────────────────────────────────────────────────────────────────── */

#[test]
fn population_at_capacity_is_accepted_immediately() {
    let reg = registry(vec![Species::new("troll", 10.0, 1.7).with_capacity(10.0)]);
    let cfg = TuneConfig::default().with_max_iterations(1);

    let tuned = tune(&reg, &ResourceLevels::default(), 20, &cfg).unwrap();
    assert_eq!(tuned.iterations, 1);
    assert!(tuned.verdict.all_stable());
    assert_eq!(tuned.registry.get("troll").unwrap().growth_rate, 1.7);
}

/* ──────────────────────────────────────────────────────────────────────────
2) Budget exhaustion
────────────────────────────────────────────────────────────────────────── */

#[test]
fn oscillating_population_exhausts_the_budget() {
    let reg = registry(vec![Species::new("goop", 1.0, 2.5).with_capacity(10.0)]);
    let cfg = TuneConfig::default().with_max_iterations(3);

    let err = tune(&reg, &ResourceLevels::default(), 50, &cfg).unwrap_err();
    let (iterations, _) = exhausted(err);
    assert_eq!(iterations, 3);
}

#[test]
fn growing_species_steps_down_once_per_non_final_iteration() {
    let reg = registry(vec![Species::new("goop", 1.0, 1.3)]);
    let cfg = TuneConfig::default().with_max_iterations(5);

    let (iterations, last) = exhausted(tune(&reg, &ResourceLevels::default(), 30, &cfg).unwrap_err());
    assert_eq!(iterations, 5);
    let r = last.get("goop").unwrap().growth_rate;
    assert!((r - 1.26).abs() < 1e-9, "r = {r}");
}

#[test]
fn zero_budget_reports_exhaustion_with_the_input() {
    let reg = registry(vec![Species::new("goop", 1.0, 1.3)]);
    let cfg = TuneConfig::default().with_max_iterations(0);

    let (iterations, last) = exhausted(tune(&reg, &ResourceLevels::default(), 10, &cfg).unwrap_err());
    assert_eq!(iterations, 0);
    assert_eq!(last.species(), reg.species());
}

/* ──────────────────────────────────────────────────────────────────────────
3) Floor and ceiling
────────────────────────────────────────────────────────────────────────── */

#[test]
fn growth_rate_never_drops_below_the_floor() {
    let reg = registry(vec![Species::new("goop", 1.0, 1.0)]);
    let cfg = TuneConfig::default().with_max_iterations(4);

    let (_, last) = exhausted(tune(&reg, &ResourceLevels::default(), 30, &cfg).unwrap_err());
    assert_eq!(last.get("goop").unwrap().growth_rate, 1.0);
}

#[test]
fn floor_lifts_every_species_on_adjustment() {
    // r = 0.1 crawls toward K and never settles in 200 steps; the first
    // adjustment lifts it to the floor, where 20 → 0 in one step and holds.
    let reg = registry(vec![Species::new("snail", 20.0, 0.1).with_capacity(10.0)]);
    let cfg = TuneConfig::default().with_max_iterations(5);

    let tuned = tune(&reg, &ResourceLevels::default(), 200, &cfg).unwrap();
    assert_eq!(tuned.iterations, 2);
    assert_eq!(tuned.registry.get("snail").unwrap().growth_rate, 1.0);
}

#[test]
fn bounded_policy_caps_growth_rate() {
    let mut reg = registry(vec![
        Species::new("beetle", 100.0, 1.995).with_capacity(0.0),
        Species::new("troll", 1.0, 0.0).preys_on(["beetle"]),
    ]);
    let out = simulate(&reg, &ResourceLevels::default(), 20).unwrap();
    let verdict = evaluate(&out, &StabilityPolicy::default());

    steer(&mut reg, &verdict, 0.01, 1.0, BOUNDED_GROWTH_CEILING);
    assert_eq!(reg.get("beetle").unwrap().growth_rate, 2.0);
    // Stable troll only moves by the floor clamp.
    assert_eq!(reg.get("troll").unwrap().growth_rate, 1.0);
}

/* ──────────────────────────────────────────────────────────────────────────
4) Tolerance
────────────────────────────────────────────────────────────────────────── */

#[test]
fn tolerance_accepts_slow_settling() {
    let reg = registry(vec![Species::new("snail", 20.0, 0.1).with_capacity(10.0)]);

    let strict = TuneConfig {
        growth_floor: 0.0,
        ..TuneConfig::default()
    }
    .with_max_iterations(3);
    let (iterations, _) = exhausted(tune(&reg, &ResourceLevels::default(), 200, &strict).unwrap_err());
    assert_eq!(iterations, 3);

    let loose = TuneConfig {
        stability: StabilityPolicy {
            tolerance: 1e-3,
            ..StabilityPolicy::default()
        },
        ..strict
    };
    let tuned = tune(&reg, &ResourceLevels::default(), 200, &loose).unwrap();
    assert_eq!(tuned.iterations, 1);
}

/* ──────────────────────────────────────────────────────────────────────────
5) Randomized search
────────────────────────────────────────────────────────────────────────── */

#[test]
fn randomized_search_replays_from_its_seed() {
    let reg = registry(vec![Species::new("goop", 5.0, 1.3), Species::new("moss", 2.0, 1.1)]);
    let cfg = TuneConfig::default()
        .with_max_iterations(10)
        .with_policy(SearchPolicy::randomized(7));

    let (_, a) = exhausted(tune(&reg, &ResourceLevels::default(), 30, &cfg).unwrap_err());
    let (_, b) = exhausted(tune(&reg, &ResourceLevels::default(), 30, &cfg).unwrap_err());
    assert_eq!(a.species(), b.species());

    for s in a.species() {
        assert!(s.growth_rate >= 1.0, "{s:?}");
        assert!(s.initial_population >= 1.0, "{s:?}");
        assert_eq!(s.initial_population.fract(), 0.0, "{s:?}");
    }
    assert_eq!(reg.get("goop").unwrap().growth_rate, 1.3);
    assert_eq!(reg.get("goop").unwrap().initial_population, 5.0);
}

#[test]
fn randomized_search_respects_a_ceiling() {
    let reg = registry(vec![Species::new("goop", 5.0, 1.9)]);
    let policy = SearchPolicy::Randomized {
        growth_rate_delta: 0.5,
        population_delta: 3,
        ceiling: Some(2.0),
        seed: 11,
    };
    let cfg = TuneConfig::default().with_max_iterations(20).with_policy(policy);

    let mut history: History<SpeciesRegistry, StabilityVerdict> = History::default();
    let _ = tune_with_observers(&reg, &ResourceLevels::default(), 30, &cfg, &mut [&mut history]);
    assert_eq!(history.entries.len(), 20);
    for (theta, _) in &history.entries {
        let r = theta.get("goop").unwrap().growth_rate;
        assert!((1.0..=2.0).contains(&r), "r = {r}");
    }
}

/* ──────────────────────────────────────────────────────────────────────────
6) Observers
────────────────────────────────────────────────────────────────────────── */

#[derive(Default)]
struct Counter {
    observed: usize,
    adjusted: usize,
    last_iteration: usize,
}

impl Observer<SpeciesRegistry, StabilityVerdict> for Counter {
    fn on_observe(&mut self, iteration: usize, _theta: &SpeciesRegistry, _obs: &StabilityVerdict) {
        self.observed += 1;
        self.last_iteration = iteration;
    }
    fn on_adjust(&mut self, _iteration: usize, _next: &SpeciesRegistry) {
        self.adjusted += 1;
    }
}

#[test]
fn observers_see_every_iteration() {
    let reg = registry(vec![Species::new("goop", 1.0, 1.3)]);
    let cfg = TuneConfig::default().with_max_iterations(6);

    let mut counter = Counter::default();
    let mut history: History<SpeciesRegistry, StabilityVerdict> = History::default();
    let err = tune_with_observers(
        &reg,
        &ResourceLevels::default(),
        30,
        &cfg,
        &mut [&mut counter, &mut history],
    )
    .unwrap_err();
    let (iterations, last) = exhausted(err);

    assert_eq!(counter.observed, iterations);
    assert_eq!(counter.adjusted, iterations - 1);
    assert_eq!(counter.last_iteration, 6);
    assert_eq!(history.entries.len(), 6);
    assert_eq!(history.entries[5].0.species(), last.species());
    assert_eq!(history.entries[0].0.get("goop").unwrap().growth_rate, 1.3);
}

/* ──────────────────────────────────────────────────────────────────────────
7) Configuration errors surface unchanged
────────────────────────────────────────────────────────────────────────── */

#[test]
fn zero_time_steps_is_a_configuration_error() {
    let reg = registry(vec![Species::new("goop", 1.0, 1.3)]);
    let err = tune(&reg, &ResourceLevels::default(), 0, &TuneConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::ZeroTimeSteps)
    ));
}

#[test]
fn negative_learning_rate_is_rejected() {
    let reg = registry(vec![Species::new("goop", 1.0, 1.3)]);
    let cfg = TuneConfig::default().with_policy(SearchPolicy::Directional {
        learning_rate: -0.01,
        ceiling: None,
    });
    let err = tune(&reg, &ResourceLevels::default(), 10, &cfg).unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::Negative { field: "learning_rate", .. })
    ));
}

#[test]
fn ceiling_below_the_floor_is_rejected() {
    let reg = registry(vec![Species::new("goop", 1.0, 1.3)]);
    let cfg = TuneConfig::default().with_policy(SearchPolicy::Directional {
        learning_rate: 0.01,
        ceiling: Some(0.5),
    });
    let err = tune(&reg, &ResourceLevels::default(), 10, &cfg).unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::CeilingBelowFloor { ceiling, floor })
            if ceiling == 0.5 && floor == 1.0
    ));
}

/* ──────────────────────────────────────────────────────────────────────────
8) Overflowing populations are never accepted
────────────────────────────────────────────────────────────────────────── */

#[test]
fn population_overflowing_to_infinity_exhausts_the_budget() {
    let reg = registry(vec![Species::new("goop", 1.0, 1.3)]);
    let out = simulate(&reg, &ResourceLevels::default(), 1000).unwrap();
    assert_eq!(out.final_row().unwrap()[0], f64::INFINITY);

    let cfg = TuneConfig::default().with_max_iterations(3);
    let (iterations, last) = exhausted(tune(&reg, &ResourceLevels::default(), 1000, &cfg).unwrap_err());
    assert_eq!(iterations, 3);
    assert!(last.get("goop").unwrap().growth_rate < 1.3);
}
