// demos/cave.rs
// Run with:
//   cargo run --example cave

use foodweb_balance::EcosystemConfig;
use foodweb_balance::systems::sdk::History;
use foodweb_balance::systems::tuner::{SearchPolicy, TuneConfig, tune_with_observers};
use foodweb_balance::systems::{engine, stability};
use foodweb_balance::{Error, SpeciesRegistry, StabilityPolicy, StabilityVerdict};

fn main() -> Result<(), Error> {
    let eco = EcosystemConfig::from_json_str(include_str!("foodweb.json"))?.build()?;
    let steps = eco.parameters.time_steps;

    let result = engine::simulate(&eco.registry, &eco.resources, steps)?;
    println!("== Cave run ({steps} steps) ==");
    println!("{}", result.columns().join(" | "));
    if let Some(last) = result.final_row() {
        println!("final -> {last:?}");
    }
    println!("zero-capacity holds -> {}", result.degeneracies().len());

    let verdict = stability::evaluate(&result, &StabilityPolicy::default());
    println!("verdict -> {verdict}");

    let cfg = TuneConfig {
        stability: StabilityPolicy {
            tolerance: 1e-6,
            include_resources: false,
        },
        ..TuneConfig::default()
    }
    .with_max_iterations(200)
    .with_policy(SearchPolicy::bounded());

    let mut history: History<SpeciesRegistry, StabilityVerdict> = History::default();
    match tune_with_observers(&eco.registry, &eco.resources, steps, &cfg, &mut [&mut history]) {
        Ok(tuned) => {
            println!("== Tuned after {} iterations ==", tuned.iterations);
            for s in tuned.registry.species() {
                println!("{:>14}: r = {:.3}", s.name, s.growth_rate);
            }
        }
        Err(Error::ConvergenceExhausted { iterations, last }) => {
            println!("== No stable point in {iterations} iterations ==");
            for s in last.species() {
                println!("{:>14}: r = {:.3}", s.name, s.growth_rate);
            }
        }
        Err(e) => return Err(e),
    }
    if let Some((_, first)) = history.entries.first() {
        println!("first verdict -> {first}");
    }
    Ok(())
}
