//! Repair workshop simulation.
//!
//! Cars break down and arrive at a workshop with a single repair bay. Every hour a car spends in
//! the workshop, waiting or being repaired, costs money. Two repair regimes, differing only in
//! the average repair time, are simulated against the very same arrivals so that their costs can
//! be compared pairwise.

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::default_trait_access,
    clippy::cast_precision_loss
)]

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

mod arrivals;
pub use arrivals::{ArrivalDelays, ArrivalGenerator, Event as ArrivalEvent};

mod car;
pub use car::{repair_time_distribution, Car, CarEvent, CarPhase, CarProcess};

mod config;
pub use config::WorkshopConfig;

pub mod replication;
pub use replication::{
    compare_with_arrivals, run_replication, run_replications, run_scenario, run_simulation,
    simulate_pair, PairedRecords, Replication,
};

pub mod report;

pub mod stats;
pub use stats::{total_stop_cost, total_stop_hours, CostComparison, ScenarioOutcome, Summary};

/// Error type encompassing all workshop errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration parameter is out of its valid range.
    #[error("Invalid value of `{field}`: {value}")]
    InvalidConfig {
        /// Name of the parameter.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// An inter-arrival delay is not a positive finite number.
    #[error("Invalid arrival delay at index {index}: {value}")]
    InvalidArrivalDelay {
        /// Position in the delay sequence.
        index: usize,
        /// Rejected value.
        value: f64,
    },
    /// The simulation engine aborted the run.
    #[error(transparent)]
    Engine(#[from] simcore::Error),
    /// Input could not be parsed.
    #[error("Unable to parse input: {0}")]
    Json(#[from] serde_json::Error),
    /// Output could not be written.
    #[error("Unable to write CSV: {0}")]
    Csv(#[from] csv::Error),
    /// I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias using [`Error`](enum.Error.html).
pub type Result<T> = std::result::Result<T, Error>;

/// Car ID, assigned in the order of arrival within a single run.
#[derive(
    From,
    Into,
    Debug,
    PartialEq,
    PartialOrd,
    Eq,
    Ord,
    Serialize,
    Deserialize,
    Copy,
    Clone,
    Hash,
    Display,
)]
pub struct CarId(usize);

/// Timing facts about a single car that has been repaired and left the workshop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarRecord {
    id: CarId,
    arrival_time: f64,
    start_repair_time: f64,
    end_repair_time: f64,
    time_stopped: f64,
}

impl CarRecord {
    /// Constructs a record; the stop time is derived from the arrival and the end of the repair.
    #[must_use]
    pub fn new(id: CarId, arrival_time: f64, start_repair_time: f64, end_repair_time: f64) -> Self {
        debug_assert!(arrival_time <= start_repair_time && start_repair_time <= end_repair_time);
        Self {
            id,
            arrival_time,
            start_repair_time,
            end_repair_time,
            time_stopped: end_repair_time - arrival_time,
        }
    }

    /// The ID of the car.
    #[must_use]
    pub fn id(&self) -> CarId {
        self.id
    }

    /// The time of the simulation when the car arrived at the workshop.
    #[must_use]
    pub fn arrival_time(&self) -> f64 {
        self.arrival_time
    }

    /// The time of the simulation when the car entered the repair bay.
    #[must_use]
    pub fn start_repair_time(&self) -> f64 {
        self.start_repair_time
    }

    /// The time of the simulation when the repair was finished.
    #[must_use]
    pub fn end_repair_time(&self) -> f64 {
        self.end_repair_time
    }

    /// Hours the car was out of service, waiting included.
    #[must_use]
    pub fn time_stopped(&self) -> f64 {
        self.time_stopped
    }

    /// Hours the car waited for the bay.
    #[must_use]
    pub fn waiting_time(&self) -> f64 {
        self.start_repair_time - self.arrival_time
    }
}
