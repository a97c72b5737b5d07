//! Stability evaluator: recent-trend classification of a finished run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mechanics::trend::{mean_tail_diff, tail_window};
use crate::systems::engine::SimulationResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Declining,
    Stable,
    Growing,
}

impl Trend {
    /// Classify a mean first difference against a symmetric tolerance band.
    /// With `tolerance = 0` only an exact zero is stable.
    ///
    /// Values never go below zero, so a NaN mean can only come from a tail
    /// that overflowed to `+inf` (`inf - inf`). It counts as growing.
    pub fn classify(mean_diff: f64, tolerance: f64) -> Self {
        if mean_diff.is_nan() || mean_diff > tolerance {
            Trend::Growing
        } else if mean_diff < -tolerance {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }

    /// Direction a growth rate should move to counter this trend.
    pub fn correction(self) -> f64 {
        match self {
            Trend::Declining => 1.0,
            Trend::Stable => 0.0,
            Trend::Growing => -1.0,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Declining => "declining",
            Trend::Stable => "stable",
            Trend::Growing => "growing",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityPolicy {
    /// Half-width of the band around zero that counts as stable.
    pub tolerance: f64,
    /// Track resource columns as well as species.
    pub include_resources: bool,
}

impl Default for StabilityPolicy {
    fn default() -> Self {
        Self {
            tolerance: 0.0,
            include_resources: true,
        }
    }
}

/// Tracked column → trend, in column order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StabilityVerdict {
    entries: Vec<(String, Trend)>,
}

impl StabilityVerdict {
    pub fn get(&self, name: &str) -> Option<Trend> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, t)| t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Trend)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), *t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn all_stable(&self) -> bool {
        self.entries.iter().all(|(_, t)| *t == Trend::Stable)
    }

    /// (declining, stable, growing)
    pub fn counts(&self) -> (usize, usize, usize) {
        self.entries
            .iter()
            .fold((0, 0, 0), |(d, s, g), (_, t)| match t {
                Trend::Declining => (d + 1, s, g),
                Trend::Stable => (d, s + 1, g),
                Trend::Growing => (d, s, g + 1),
            })
    }
}

impl fmt::Display for StabilityVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, trend)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {trend}")?;
        }
        Ok(())
    }
}

/// Classify each tracked column by the mean of its last ceil(10%) first
/// differences. A run too short to have differences is stable.
pub fn evaluate(result: &SimulationResult, policy: &StabilityPolicy) -> StabilityVerdict {
    let tracked = if policy.include_resources {
        result.columns().len()
    } else {
        result.species_count()
    };
    let window = tail_window(result.time_steps());
    let entries = result.columns()[..tracked]
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let series: Vec<f64> = result.rows().iter().map(|r| r[j]).collect();
            let trend = mean_tail_diff(&series, window)
                .map_or(Trend::Stable, |m| Trend::classify(m, policy.tolerance));
            (name.clone(), trend)
        })
        .collect();
    StabilityVerdict { entries }
}
