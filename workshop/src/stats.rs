//! Reduces per-car records into stop hours and costs.
//!
//! Nothing here depends on the simulation engine: the functions only consume the record log a
//! run produces.

use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::{CarRecord, WorkshopConfig};

/// Total hours all cars were out of service.
#[must_use]
pub fn total_stop_hours(records: &[CarRecord]) -> f64 {
    records.iter().map(CarRecord::time_stopped).sum()
}

/// Total downtime cost given the cost of one stopped hour.
#[must_use]
pub fn total_stop_cost(records: &[CarRecord], stop_cost_rate: f64) -> f64 {
    total_stop_hours(records) * stop_cost_rate
}

/// Aggregated metrics of a single scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    /// Number of cars repaired within the horizon.
    pub cars: usize,
    /// Sum of stop times.
    pub stop_hours: f64,
    /// Downtime cost.
    pub stop_cost: f64,
    /// Downtime cost plus maintenance over all simulated days.
    pub total_cost: f64,
}

impl ScenarioOutcome {
    /// Reduces the record log of one run.
    #[must_use]
    pub fn from_records(records: &[CarRecord], config: &WorkshopConfig) -> Self {
        let stop_hours = total_stop_hours(records);
        let stop_cost = stop_hours * config.stop_cost_rate;
        Self {
            cars: records.len(),
            stop_hours,
            stop_cost,
            total_cost: stop_cost + f64::from(config.total_days) * config.maintenance_cost,
        }
    }
}

/// Cost comparison of the initial and the new repair regime under the same arrivals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostComparison {
    /// The highest daily cost the new system may have and still not cost more than the initial
    /// one: `(initial_total_cost - new_stop_cost) / total_days`.
    pub max_allowed_daily_cost_increase: f64,
    /// Downtime cost of the new system plus the highest allowed daily cost over all days.
    pub new_total_cost_with_price_increase: f64,
    /// How much the highest allowed daily cost exceeds the current maintenance cost.
    pub margin_over_maintenance: f64,
}

impl CostComparison {
    /// Compares two outcomes obtained with the same arrivals.
    #[must_use]
    pub fn new(initial: &ScenarioOutcome, new: &ScenarioOutcome, config: &WorkshopConfig) -> Self {
        let days = f64::from(config.total_days);
        let max_allowed_daily_cost_increase = (initial.total_cost - new.stop_cost) / days;
        Self {
            max_allowed_daily_cost_increase,
            new_total_cost_with_price_increase: new.stop_cost
                + days * max_allowed_daily_cost_increase,
            margin_over_maintenance: max_allowed_daily_cost_increase - config.maintenance_cost,
        }
    }
}

/// Means over many replications.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// Number of replications.
    pub replications: usize,
    /// Mean stop hours of the initial system.
    pub mean_initial_stop_hours: f64,
    /// Mean stop hours of the new system.
    pub mean_new_stop_hours: f64,
    /// Mean total cost of the initial system.
    pub mean_initial_total_cost: f64,
    /// Mean total cost of the new system.
    pub mean_new_total_cost: f64,
    /// Mean of [`CostComparison::margin_over_maintenance`].
    pub mean_margin_over_maintenance: f64,
    /// Smallest and largest margin observed.
    pub margin_range: (f64, f64),
}

impl Summary {
    /// Summarizes `(initial, new, comparison)` triples; returns `None` if there are none.
    pub fn new<'a, I>(results: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a ScenarioOutcome, &'a ScenarioOutcome, &'a CostComparison)>,
    {
        let results = results.into_iter().collect_vec();
        if results.is_empty() {
            return None;
        }
        let n = results.len() as f64;
        let mean = |f: &dyn Fn(&(&ScenarioOutcome, &ScenarioOutcome, &CostComparison)) -> f64| {
            results.iter().map(f).sum::<f64>() / n
        };
        let margin_range = match results
            .iter()
            .map(|(_, _, c)| c.margin_over_maintenance)
            .minmax()
        {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(m) => (m, m),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        Some(Self {
            replications: results.len(),
            mean_initial_stop_hours: mean(&|(i, _, _)| i.stop_hours),
            mean_new_stop_hours: mean(&|(_, n, _)| n.stop_hours),
            mean_initial_total_cost: mean(&|(i, _, _)| i.total_cost),
            mean_new_total_cost: mean(&|(_, n, _)| n.total_cost),
            mean_margin_over_maintenance: mean(&|(_, _, c)| c.margin_over_maintenance),
            margin_range,
        })
    }
}
