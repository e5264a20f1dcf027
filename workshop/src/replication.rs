//! Runs scenarios and independent replications of the paired comparison.

use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaChaRng};
use rand_distr::Distribution;
use rayon::prelude::*;
use serde::Serialize;
use simcore::Simulation;

use crate::{
    repair_time_distribution, ArrivalDelays, ArrivalEvent, ArrivalGenerator, CarEvent, CarProcess,
    CarRecord, CostComparison, Result, ScenarioOutcome, WorkshopConfig,
};

/// Purpose of a random stream within one replication.
#[derive(Debug, Clone, Copy)]
enum Stream {
    Arrivals = 0,
    InitialRepairs = 1,
    NewRepairs = 2,
}

/// Derives the random stream for `role` in the given replication from the global seed.
/// Streams never overlap, so replications can run in any order, or in parallel.
fn stream(seed: u64, replication: usize, role: Stream) -> ChaChaRng {
    let mut rng = ChaChaRng::seed_from_u64(seed);
    rng.set_stream(replication as u64 * 3 + role as u64);
    rng
}

/// Runs a single scenario with an arbitrary repair-time distribution, returning the records of
/// all cars repaired before `horizon`, in the order they left the workshop.
///
/// # Errors
///
/// Returns an error if the horizon is invalid or the run is aborted, e.g., because the arrival
/// delays ran out before the horizon.
pub fn run_scenario<R, D>(
    rng: R,
    repair_time: D,
    horizon: f64,
    delays: &ArrivalDelays,
) -> Result<Vec<CarRecord>>
where
    R: Rng + 'static,
    D: Distribution<f64> + 'static,
{
    let mut sim = Simulation::default();
    let bay = sim.add_resource::<CarEvent>();
    let records = sim.state.insert(Vec::<CarRecord>::new());
    let cars = sim.add_component(CarProcess::new(rng, repair_time, bay, records));
    let arrivals = sim.add_component(ArrivalGenerator::new(delays, cars));
    sim.schedule(0.0, arrivals, ArrivalEvent::Start)?;
    sim.run_until(horizon)?;
    let records = sim
        .state
        .remove(records)
        .ok_or(simcore::Error::MissingValue("car record log"))?;
    let bay = sim.state.resource(bay);
    log::debug!(
        "{} cars repaired; {} in the workshop at the horizon; longest line: {}",
        records.len(),
        bay.queue_len() + usize::from(bay.is_busy()),
        bay.max_queue_len()
    );
    Ok(records)
}

/// Runs a single scenario with exponentially distributed repair times.
///
/// # Errors
///
/// See [`run_scenario`]; additionally fails if the mean repair time is not positive.
pub fn run_simulation<R: Rng + 'static>(
    average_repair_time: f64,
    simulation_time: f64,
    delays: &ArrivalDelays,
    rng: R,
) -> Result<Vec<CarRecord>> {
    run_scenario(
        rng,
        repair_time_distribution(average_repair_time)?,
        simulation_time,
        delays,
    )
}

/// Records of both scenarios run against the same arrivals.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedRecords {
    /// Arrival delays shared by both scenarios.
    pub delays: ArrivalDelays,
    /// Records with the initial average repair time.
    pub initial: Vec<CarRecord>,
    /// Records with the new average repair time.
    pub new: Vec<CarRecord>,
}

/// Generates the arrivals of replication `index` and runs both scenarios against them.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any of the runs fails.
pub fn simulate_pair(config: &WorkshopConfig, index: usize) -> Result<PairedRecords> {
    let horizon = config.simulation_time();
    let delays = ArrivalDelays::generate(
        &mut stream(config.random_seed, index, Stream::Arrivals),
        config.average_arrival_time,
        horizon,
    )?;
    pair_with_arrivals(config, index, delays)
}

fn pair_with_arrivals(
    config: &WorkshopConfig,
    index: usize,
    delays: ArrivalDelays,
) -> Result<PairedRecords> {
    let horizon = config.simulation_time();
    let initial = run_simulation(
        config.average_repair_time,
        horizon,
        &delays,
        stream(config.random_seed, index, Stream::InitialRepairs),
    )?;
    let new = run_simulation(
        config.new_average_repair_time,
        horizon,
        &delays,
        stream(config.random_seed, index, Stream::NewRepairs),
    )?;
    Ok(PairedRecords {
        delays,
        initial,
        new,
    })
}

/// Outcome of one replication.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Replication {
    /// Replication number.
    pub index: usize,
    /// Initial system.
    pub initial: ScenarioOutcome,
    /// New system.
    pub new: ScenarioOutcome,
    /// Comparison of the two.
    pub comparison: CostComparison,
}

impl Replication {
    /// Reduces the records of both scenarios.
    #[must_use]
    pub fn from_records(index: usize, pair: &PairedRecords, config: &WorkshopConfig) -> Self {
        let initial = ScenarioOutcome::from_records(&pair.initial, config);
        let new = ScenarioOutcome::from_records(&pair.new, config);
        Self {
            index,
            initial,
            new,
            comparison: CostComparison::new(&initial, &new, config),
        }
    }
}

/// Runs replication `index`.
///
/// # Errors
///
/// See [`simulate_pair`].
pub fn run_replication(config: &WorkshopConfig, index: usize) -> Result<Replication> {
    let pair = simulate_pair(config, index)?;
    let replication = Replication::from_records(index, &pair, config);
    log::info!(
        "Replication {}: stop hours {:.2} -> {:.2}, max allowed daily cost increase {:.2}",
        index,
        replication.initial.stop_hours,
        replication.new.stop_hours,
        replication.comparison.max_allowed_daily_cost_increase
    );
    if replication.comparison.margin_over_maintenance < 0.0 {
        log::warn!(
            "Replication {}: the new system does not pay off even at the current maintenance cost",
            index
        );
    }
    Ok(replication)
}

/// Runs a single paired comparison against the given arrivals instead of generated ones.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, any run fails, or the delays do not cover
/// the horizon.
pub fn compare_with_arrivals(config: &WorkshopConfig, delays: ArrivalDelays) -> Result<Replication> {
    config.validate()?;
    let pair = pair_with_arrivals(config, 0, delays)?;
    Ok(Replication::from_records(0, &pair, config))
}

/// Runs `replications` independent replications in parallel, calling `on_finished` after each.
/// The results are ordered by replication index regardless of the order they finish in.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any of the replications fails.
pub fn run_replications<F>(
    config: &WorkshopConfig,
    replications: usize,
    on_finished: F,
) -> Result<Vec<Replication>>
where
    F: Fn(&Replication) + Sync,
{
    config.validate()?;
    (0..replications)
        .into_par_iter()
        .map(|index| {
            let replication = run_replication(config, index)?;
            on_finished(&replication);
            Ok(replication)
        })
        .collect()
}
