//! CSV output of replication results and car records.

use std::io::Write;

use serde::Serialize;

use crate::{CarRecord, Replication, Result};

/// A flattened [`Replication`], one CSV row per replication.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReplicationRow {
    replication: usize,
    initial_cars: usize,
    new_cars: usize,
    initial_stop_hours: f64,
    new_stop_hours: f64,
    initial_stop_cost: f64,
    new_stop_cost: f64,
    initial_total_cost: f64,
    new_total_cost: f64,
    max_allowed_daily_cost_increase: f64,
    new_total_cost_with_price_increase: f64,
    margin_over_maintenance: f64,
}

impl From<&Replication> for ReplicationRow {
    fn from(r: &Replication) -> Self {
        Self {
            replication: r.index,
            initial_cars: r.initial.cars,
            new_cars: r.new.cars,
            initial_stop_hours: r.initial.stop_hours,
            new_stop_hours: r.new.stop_hours,
            initial_stop_cost: r.initial.stop_cost,
            new_stop_cost: r.new.stop_cost,
            initial_total_cost: r.initial.total_cost,
            new_total_cost: r.new.total_cost,
            max_allowed_daily_cost_increase: r.comparison.max_allowed_daily_cost_increase,
            new_total_cost_with_price_increase: r.comparison.new_total_cost_with_price_increase,
            margin_over_maintenance: r.comparison.margin_over_maintenance,
        }
    }
}

/// Writes one row per replication, with a header.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_replications<'a, W, I>(writer: W, replications: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Replication>,
{
    let mut writer = csv::Writer::from_writer(writer);
    for replication in replications {
        writer.serialize(ReplicationRow::from(replication))?;
    }
    writer.flush()?;
    Ok(())
}

/// Scenario a car record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Initial average repair time.
    Initial,
    /// New average repair time.
    New,
}

/// Writes car records of both scenarios, tagging each row with its scenario.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_records<W: Write>(writer: W, initial: &[CarRecord], new: &[CarRecord]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(&[
        "scenario",
        "id",
        "arrival_time",
        "start_repair_time",
        "end_repair_time",
        "time_stopped",
    ])?;
    let rows = initial
        .iter()
        .map(|record| (Scenario::Initial, record))
        .chain(new.iter().map(|record| (Scenario::New, record)));
    for (scenario, record) in rows {
        writer.serialize((
            scenario,
            record.id(),
            record.arrival_time(),
            record.start_repair_time(),
            record.end_repair_time(),
            record.time_stopped(),
        ))?;
    }
    writer.flush()?;
    Ok(())
}
