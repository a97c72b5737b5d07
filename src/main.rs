//! Food-web CLI.
//!
//! Commands:
//! - simulate: run one configuration and write its time series
//! - tune: search growth rates for a stable ecosystem
//! - sweep: scan initial populations × a shared growth rate

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use foodweb_balance::config::Ecosystem;
use foodweb_balance::systems::sweep::{SweepGrid, sweep};
use foodweb_balance::systems::tuner::{BOUNDED_GROWTH_CEILING, SearchPolicy, TuneConfig, tune};
use foodweb_balance::systems::{engine, stability};
use foodweb_balance::{Error, SpeciesRegistry, StabilityPolicy, StabilityVerdict, Table};

/// Exit status when the tuner runs out of iterations.
const EXIT_EXHAUSTED: u8 = 2;

#[derive(Parser)]
#[command(name = "foodweb")]
#[command(version)]
#[command(about = "Food-web simulation and stability search")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and write the full time series
    Simulate {
        /// Ecosystem document (JSON)
        #[arg(long)]
        config: PathBuf,

        /// Delimited output file for the time series
        #[arg(long)]
        output: Option<PathBuf>,

        /// Override simulation_parameters.time_steps
        #[arg(long)]
        time_steps: Option<usize>,

        /// Rows shown from each end of the series
        #[arg(long, default_value_t = 10)]
        preview: usize,
    },

    /// Search growth rates until every tracked quantity is stable
    Tune {
        /// Ecosystem document (JSON)
        #[arg(long)]
        config: PathBuf,

        /// Search policy
        #[arg(long, value_enum, default_value_t = Policy::Directional)]
        policy: Policy,

        /// Maximum simulate/evaluate/adjust cycles
        #[arg(long, default_value_t = 1000)]
        max_iterations: usize,

        /// Growth-rate step for directional policies
        #[arg(long, default_value_t = 0.01)]
        learning_rate: f64,

        /// Mean-difference band counted as stable (0 = exact)
        #[arg(long, default_value_t = 0.0)]
        tolerance: f64,

        /// Ignore resource trends when judging stability
        #[arg(long)]
        species_only: bool,

        /// Seed for the randomized policy
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// JSON report with the tuned (or last tried) species
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run one simulation per grid point and collect final states
    Sweep {
        /// Ecosystem document (JSON)
        #[arg(long)]
        config: PathBuf,

        /// Species whose initial population is swept (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        species: Vec<String>,

        /// Initial populations to try (comma-separated)
        #[arg(long, value_delimiter = ',', default_values_t = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0])]
        populations: Vec<f64>,

        /// Shared growth rates to try (comma-separated)
        #[arg(long, value_delimiter = ',', default_values_t = [1.0, 1.2, 1.4, 1.6, 1.8, 2.0, 2.2, 2.4])]
        growth_rates: Vec<f64>,

        /// Override simulation_parameters.time_steps
        #[arg(long)]
        time_steps: Option<usize>,

        /// Delimited output file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// Step growth rates against each species' trend
    Directional,
    /// Directional, with growth rates capped at 2
    Bounded,
    /// Seeded jitter of growth rates and initial populations
    Randomized,
}

#[derive(Serialize)]
struct TuneReport<'a> {
    converged: bool,
    iterations: usize,
    verdict: Option<&'a StabilityVerdict>,
    species: &'a SpeciesRegistry,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("failed to install tracing subscriber");
    }

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Simulate {
            config,
            output,
            time_steps,
            preview,
        } => {
            let eco = load(&config)?;
            let steps = time_steps.unwrap_or(eco.parameters.time_steps);
            let result = engine::simulate(&eco.registry, &eco.resources, steps)?;
            if !result.degeneracies().is_empty() {
                info!(
                    count = result.degeneracies().len(),
                    "species held at zero carrying capacity"
                );
            }
            print_preview(result.table(), preview)?;
            let verdict = stability::evaluate(&result, &StabilityPolicy::default());
            info!(%verdict, "trend over the final window");
            if let Some(path) = output {
                write_table(result.table(), &path)?;
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Tune {
            config,
            policy,
            max_iterations,
            learning_rate,
            tolerance,
            species_only,
            seed,
            output,
        } => {
            let eco = load(&config)?;
            let policy = match policy {
                Policy::Directional => SearchPolicy::Directional {
                    learning_rate,
                    ceiling: None,
                },
                Policy::Bounded => SearchPolicy::Directional {
                    learning_rate,
                    ceiling: Some(BOUNDED_GROWTH_CEILING),
                },
                Policy::Randomized => SearchPolicy::randomized(seed),
            };
            let cfg = TuneConfig {
                stability: StabilityPolicy {
                    tolerance,
                    include_resources: !species_only,
                },
                ..TuneConfig::default()
            }
            .with_max_iterations(max_iterations)
            .with_policy(policy);

            match tune(&eco.registry, &eco.resources, eco.parameters.time_steps, &cfg) {
                Ok(tuned) => {
                    info!(iterations = tuned.iterations, "converged");
                    if let Some(path) = output {
                        write_report(
                            &TuneReport {
                                converged: true,
                                iterations: tuned.iterations,
                                verdict: Some(&tuned.verdict),
                                species: &tuned.registry,
                            },
                            &path,
                        )?;
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(Error::ConvergenceExhausted { iterations, last }) => {
                    warn!(iterations, "failed to find stable conditions within the given iterations");
                    if let Some(path) = output {
                        write_report(
                            &TuneReport {
                                converged: false,
                                iterations,
                                verdict: None,
                                species: &last,
                            },
                            &path,
                        )?;
                    }
                    Ok(ExitCode::from(EXIT_EXHAUSTED))
                }
                Err(err) => Err(err.into()),
            }
        }

        Commands::Sweep {
            config,
            species,
            populations,
            growth_rates,
            time_steps,
            output,
        } => {
            let eco = load(&config)?;
            let grid = SweepGrid {
                species,
                initial_populations: populations,
                growth_rates,
            };
            info!(runs = grid.runs(), "starting sweep");
            let steps = time_steps.unwrap_or(eco.parameters.time_steps);
            let table = sweep(&eco.registry, &eco.resources, steps, &grid)?;
            match output {
                Some(path) => write_table(&table, &path)?,
                None => table
                    .write_delimited(io::stdout().lock(), ',')
                    .context("failed to write sweep to stdout")?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load(path: &Path) -> Result<Ecosystem> {
    Ecosystem::load(path).with_context(|| format!("loading {}", path.display()))
}

fn write_table(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    table
        .write_delimited(BufWriter::new(file), ',')
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), rows = table.len(), "results written");
    Ok(())
}

fn write_report(report: &TuneReport<'_>, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, report)
        .with_context(|| format!("writing {}", path.display()))?;
    out.flush()?;
    info!(path = %path.display(), "tuning report written");
    Ok(())
}

fn print_preview(table: &Table, rows: usize) -> Result<()> {
    if rows == 0 {
        return Ok(());
    }
    let mut out = io::stdout().lock();
    let header: String = table.columns().iter().map(|c| format!("{c:>14}")).collect();
    print_rows(&mut out, &format!("First {rows} rows:"), &header, table.head(rows))?;
    print_rows(&mut out, &format!("\nLast {rows} rows:"), &header, table.tail(rows))?;
    Ok(())
}

fn print_rows(out: &mut impl Write, label: &str, header: &str, rows: &[Vec<f64>]) -> io::Result<()> {
    writeln!(out, "{label}")?;
    writeln!(out, "{header}")?;
    for row in rows {
        let cells: String = row.iter().map(|v| format!("{v:>14.4}")).collect();
        writeln!(out, "{cells}")?;
    }
    Ok(())
}
