use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Constant parameters shared by all replications.
///
/// Missing fields take their default values, so a configuration file only needs to list what
/// it changes.
///
/// ```
/// # use workshop::WorkshopConfig;
/// let config = WorkshopConfig::from_reader(r#"{"total_days": 30}"#.as_bytes()).unwrap();
/// assert_eq!(config.simulation_time(), 720.0);
/// assert_eq!(config.average_repair_time, 7.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkshopConfig {
    /// Mean hours between two consecutive car arrivals.
    pub average_arrival_time: f64,
    /// Mean repair hours in the initial system.
    pub average_repair_time: f64,
    /// Mean repair hours in the new system.
    pub new_average_repair_time: f64,
    /// Number of simulated days.
    pub total_days: u32,
    /// Seed from which all random streams are derived.
    pub random_seed: u64,
    /// Fixed daily cost, paid whether or not any car is stopped.
    pub maintenance_cost: f64,
    /// Cost of one hour of a single car's downtime.
    pub stop_cost_rate: f64,
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            average_arrival_time: 8.0,
            average_repair_time: 7.0,
            new_average_repair_time: 5.0,
            total_days: 365,
            random_seed: 42,
            maintenance_cost: 375.0,
            stop_cost_rate: 25.0 / 24.0,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig { field, value })
    }
}

impl WorkshopConfig {
    /// Parses a JSON configuration and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid JSON or any value is out of range.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Simulation horizon in hours.
    #[must_use]
    pub fn simulation_time(&self) -> f64 {
        24.0 * f64::from(self.total_days)
    }

    /// Checks that all means and the horizon are positive and costs are non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        positive("average_arrival_time", self.average_arrival_time)?;
        positive("average_repair_time", self.average_repair_time)?;
        positive("new_average_repair_time", self.new_average_repair_time)?;
        positive("total_days", f64::from(self.total_days))?;
        non_negative("maintenance_cost", self.maintenance_cost)?;
        non_negative("stop_cost_rate", self.stop_cost_rate)?;
        Ok(())
    }
}
